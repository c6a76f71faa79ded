use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Start,
    Move,
    /// Ends the drag where the last move left it; coordinates are ignored.
    End,
    /// Pointer left the surface; the drag ends without snapping.
    Cancel,
}

/// Canvas-local pointer or touch event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

impl PointerInput {
    pub fn start(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Start,
            x,
            y,
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
        }
    }

    pub fn end(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::End,
            x,
            y,
        }
    }

    pub fn cancel() -> Self {
        Self {
            phase: PointerPhase::Cancel,
            x: 0.0,
            y: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsAction {
    TimeStep(i32),
    GridStep(i32),
}
