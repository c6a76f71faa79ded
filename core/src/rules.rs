use serde::{Deserialize, Serialize};

pub const SNAP_DISTANCE_DEFAULT: f32 = 60.0;
pub const HEADER_HEIGHT_DEFAULT: f32 = 110.0;
pub const SCATTER_MARGIN_DEFAULT: f32 = 20.0;
pub const COMPLETE_NOTICE_DELAY_MS: u64 = 800;
pub const CONFETTI_FRAME_MS: u64 = 16;
pub const COUNTDOWN_PERIOD_MS: u64 = 1000;

pub const TIME_PER_STAGE_MIN: u32 = 10;
pub const TIME_PER_STAGE_MAX: u32 = 600;
pub const TIME_PER_STAGE_DEFAULT: u32 = 60;
pub const TIME_PER_STAGE_STEP: i32 = 10;

pub const GRID_MULTIPLIER_MIN: f32 = 0.5;
pub const GRID_MULTIPLIER_MAX: f32 = 2.0;
pub const GRID_MULTIPLIER_DEFAULT: f32 = 1.0;
pub const GRID_MULTIPLIER_STEP: f32 = 0.1;

/// Fixed tuning values shared by every stage of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub snap_distance: f32,
    pub header_height: f32,
    pub scatter_margin: f32,
    pub complete_notice_delay_ms: u64,
    pub confetti_frame_ms: u64,
    pub countdown_period_ms: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            snap_distance: SNAP_DISTANCE_DEFAULT,
            header_height: HEADER_HEIGHT_DEFAULT,
            scatter_margin: SCATTER_MARGIN_DEFAULT,
            complete_notice_delay_ms: COMPLETE_NOTICE_DELAY_MS,
            confetti_frame_ms: CONFETTI_FRAME_MS,
            countdown_period_ms: COUNTDOWN_PERIOD_MS,
        }
    }
}

impl GameRules {
    /// Neighbor snapping uses a tighter radius than snapping to the target.
    pub fn neighbor_snap_distance(&self) -> f32 {
        self.snap_distance * 0.5
    }
}

/// User-tunable values. Always passed into stage construction explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSessionSettings")]
pub struct SessionSettings {
    time_per_stage: u32,
    grid_multiplier: f32,
}

#[derive(Deserialize)]
struct RawSessionSettings {
    time_per_stage: u32,
    grid_multiplier: f32,
}

impl From<RawSessionSettings> for SessionSettings {
    fn from(raw: RawSessionSettings) -> Self {
        Self::new(raw.time_per_stage, raw.grid_multiplier)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_per_stage: TIME_PER_STAGE_DEFAULT,
            grid_multiplier: GRID_MULTIPLIER_DEFAULT,
        }
    }
}

impl SessionSettings {
    pub fn new(time_per_stage: u32, grid_multiplier: f32) -> Self {
        let mut settings = Self::default();
        settings.set_time_per_stage(time_per_stage);
        settings.set_grid_multiplier(grid_multiplier);
        settings
    }

    pub fn time_per_stage(&self) -> u32 {
        self.time_per_stage
    }

    pub fn grid_multiplier(&self) -> f32 {
        self.grid_multiplier
    }

    pub fn set_time_per_stage(&mut self, seconds: u32) {
        self.time_per_stage = seconds.clamp(TIME_PER_STAGE_MIN, TIME_PER_STAGE_MAX);
    }

    pub fn set_grid_multiplier(&mut self, value: f32) {
        let value = if value.is_finite() {
            value
        } else {
            GRID_MULTIPLIER_DEFAULT
        };
        self.grid_multiplier = value.clamp(GRID_MULTIPLIER_MIN, GRID_MULTIPLIER_MAX);
    }

    /// Steps the countdown length by `steps` increments of ten seconds.
    pub fn adjust_time(&mut self, steps: i32) {
        let next = self.time_per_stage as i64 + (steps as i64) * (TIME_PER_STAGE_STEP as i64);
        let next = next.clamp(TIME_PER_STAGE_MIN as i64, TIME_PER_STAGE_MAX as i64);
        self.time_per_stage = next as u32;
    }

    pub fn adjust_grid(&mut self, steps: i32) {
        let next = self.grid_multiplier + steps as f32 * GRID_MULTIPLIER_STEP;
        // Keep one decimal so repeated steps do not drift.
        self.set_grid_multiplier((next * 10.0).round() / 10.0);
    }

    /// Row or column count for a stage dimension under the current multiplier.
    pub fn scaled_count(&self, base: u32) -> u32 {
        let scaled = (base as f32 * self.grid_multiplier).round();
        (scaled as u32).max(1)
    }
}
