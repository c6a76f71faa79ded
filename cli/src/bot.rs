use super::*;
use puzzlegift::StageEvent;
use puzzlegift_core::grid::is_border_piece;
use puzzlegift_core::{PieceSnapshot, PointerInput, SessionSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::VecDeque;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout, Duration, Instant};

#[derive(clap::Subcommand)]
pub(super) enum BotCommand {
    Run {
        #[command(flatten)]
        stage: StageArgs,
        /// First stage to play, 1-based.
        #[arg(long, default_value_t = 1)]
        from: usize,
        /// Keep going through the whole catalog.
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 40)]
        think_min_ms: u64,
        #[arg(long, default_value_t = 160)]
        think_max_ms: u64,
        #[arg(long, default_value_t = 6)]
        drag_steps: u32,
        #[arg(long, default_value_t = 16)]
        step_ms: u64,
        #[arg(long, default_value_t = 3.0)]
        jitter_px: f32,
        /// Chance of dropping a piece somewhere other than its slot.
        #[arg(long, default_value_t = 0.1)]
        miss_rate: f64,
    },
}

pub(super) async fn run(command: BotCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        BotCommand::Run {
            stage,
            from,
            all,
            think_min_ms,
            think_max_ms,
            drag_steps,
            step_ms,
            jitter_px,
            miss_rate,
        } => {
            let config = BotRunConfig {
                think_min_ms,
                think_max_ms,
                drag_steps,
                step_ms,
                jitter_px,
                miss_rate,
            };
            validate_bot_config(config)?;
            let app = stage.config()?;
            let seed = app.seed;
            let runtime = StageRuntime::new(AppCore::new(app), stage.assets(false));
            let first = from.max(1) - 1;
            let reports = run_bot(&runtime, config, seed, first, all).await?;
            for report in &reports {
                println!("{report}");
            }
            Ok(())
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BotRunConfig {
    pub think_min_ms: u64,
    pub think_max_ms: u64,
    pub drag_steps: u32,
    pub step_ms: u64,
    pub jitter_px: f32,
    pub miss_rate: f64,
}

impl Default for BotRunConfig {
    fn default() -> Self {
        Self {
            think_min_ms: 40,
            think_max_ms: 160,
            drag_steps: 6,
            step_ms: 16,
            jitter_px: 3.0,
            miss_rate: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StageReport {
    pub index: usize,
    pub title: String,
    pub pieces: usize,
    pub drops: u32,
    pub misses: u32,
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stage {} '{}': {} pieces, {} drops ({} missed) in {:.1}s{}",
            self.index + 1,
            self.title,
            self.pieces,
            self.drops,
            self.misses,
            self.elapsed.as_secs_f32(),
            if self.timed_out { ", over time" } else { "" }
        )
    }
}

/// Events observed since the bot last looked.
#[derive(Default)]
struct EventInbox {
    queue: RefCell<VecDeque<StageEvent>>,
    notify: Notify,
}

impl EventInbox {
    fn push(&self, event: StageEvent) {
        self.queue.borrow_mut().push_back(event);
        self.notify.notify_one();
    }

    fn drain(&self) -> Vec<StageEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    async fn wait_for(
        &self,
        limit: Duration,
        matches: impl Fn(&StageEvent) -> bool,
    ) -> Result<StageEvent, Box<dyn std::error::Error>> {
        let deadline = Instant::now() + limit;
        loop {
            let found = {
                let mut queue = self.queue.borrow_mut();
                let position = queue.iter().position(&matches);
                position.and_then(|position| queue.remove(position))
            };
            if let Some(event) = found {
                return Ok(event);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err("timed out waiting for a stage event".into());
            }
            let _ = timeout(remaining, self.notify.notified()).await;
        }
    }
}

fn validate_bot_config(config: BotRunConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.think_min_ms > config.think_max_ms {
        return Err("think_min_ms must not exceed think_max_ms".into());
    }
    if config.drag_steps == 0 {
        return Err("drag_steps must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&config.miss_rate) {
        return Err("miss_rate must be within [0, 1]".into());
    }
    if !config.jitter_px.is_finite() || config.jitter_px < 0.0 {
        return Err("jitter_px must be a non-negative number".into());
    }
    Ok(())
}

pub(crate) async fn run_bot(
    runtime: &StageRuntime,
    config: BotRunConfig,
    seed: u64,
    first: usize,
    all: bool,
) -> Result<Vec<StageReport>, Box<dyn std::error::Error>> {
    let inbox = Rc::new(EventInbox::default());
    let sink = Rc::clone(&inbox);
    runtime
        .core()
        .set_event_hook(Some(Rc::new(move |event| sink.push(event))));
    let mut rng = StdRng::seed_from_u64(seed ^ 0xB07);
    let mut reports = Vec::new();

    let mut load = runtime.load_stage(first).await;
    while let StageLoad::Pending { index, stage, .. } = load {
        let started = Instant::now();
        let mut report = StageReport {
            index,
            title: stage.title,
            pieces: 0,
            drops: 0,
            misses: 0,
            elapsed: Duration::ZERO,
            timed_out: false,
        };
        loop {
            for event in inbox.drain() {
                match event {
                    StageEvent::StageTimeout { .. } => {
                        log::warn!("stage {} ran out of time, still solving", index + 1);
                        report.timed_out = true;
                    }
                    StageEvent::TimeLeft { seconds, .. } => {
                        log::debug!("stage {} time left {seconds}s", index + 1)
                    }
                    other => log::debug!("event {other:?}"),
                }
            }
            let Some(session) = runtime.core().snapshot().session else {
                return Err("stage lost its puzzle while playing".into());
            };
            report.pieces = session.pieces.len();
            if session.complete {
                break;
            }
            let think = rng.random_range(config.think_min_ms..=config.think_max_ms);
            sleep(Duration::from_millis(think)).await;
            let locked = play_move(runtime, &session, config, &mut rng).await?;
            report.drops += 1;
            if !locked {
                report.misses += 1;
            }
        }
        report.elapsed = started.elapsed();

        let delay = Duration::from_millis(runtime.core().rules().complete_notice_delay_ms);
        inbox
            .wait_for(delay * 4 + Duration::from_secs(1), |event| {
                matches!(event, StageEvent::StageComplete { index: done } if *done == index)
            })
            .await?;
        log::info!("{report}");
        reports.push(report);
        if !all {
            runtime.shutdown();
            break;
        }
        load = runtime.next_stage().await;
    }
    runtime.core().set_event_hook(None);
    Ok(reports)
}

/// Grabs one free piece and drags it. Returns whether it ended up locked.
async fn play_move(
    runtime: &StageRuntime,
    session: &SessionSnapshot,
    config: BotRunConfig,
    rng: &mut StdRng,
) -> Result<bool, Box<dyn std::error::Error>> {
    let free: Vec<&PieceSnapshot> = session.pieces.iter().filter(|piece| !piece.locked).collect();
    if free.is_empty() {
        return Err("no free piece left on an unsolved board".into());
    }
    // Edges first, the way people usually start.
    let border: Vec<&PieceSnapshot> = free
        .iter()
        .copied()
        .filter(|piece| is_border_piece(piece.row, piece.col, session.rows, session.cols))
        .collect();
    let pool = if border.is_empty() { &free } else { &border };
    let choice = pool[rng.random_range(0..pool.len())];
    let grab = (
        choice.x + choice.width * 0.5,
        choice.y + choice.height * 0.5,
    );
    runtime.pointer(PointerInput::start(grab.0, grab.1));
    let picked = runtime
        .core()
        .snapshot()
        .session
        .and_then(|session| session.dragging.map(|index| session.pieces[index].clone()));
    let Some(piece) = picked else {
        return Err("pointer down on a free piece did not pick anything".into());
    };
    let offset = (grab.0 - piece.x, grab.1 - piece.y);
    let missed = rng.random_bool(config.miss_rate);
    let (dest_x, dest_y) = if missed {
        // Far enough from the slot that neither snap can catch it.
        let away = runtime.core().rules().snap_distance * 2.0 + piece.width.max(piece.height);
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        (
            piece.correct_x + angle.cos() * away,
            piece.correct_y + angle.sin() * away,
        )
    } else {
        let jitter = config.jitter_px;
        (
            piece.correct_x + rng.random_range(-jitter..=jitter),
            piece.correct_y + rng.random_range(-jitter..=jitter),
        )
    };
    for step in 1..=config.drag_steps {
        let t = step as f32 / config.drag_steps as f32;
        let x = lerp_f32(piece.x, dest_x, t) + offset.0;
        let y = lerp_f32(piece.y, dest_y, t) + offset.1;
        runtime.pointer(PointerInput::moved(x, y));
        sleep(Duration::from_millis(config.step_ms)).await;
    }
    runtime.pointer(PointerInput::end(dest_x + offset.0, dest_y + offset.1));
    let locked = runtime
        .core()
        .snapshot()
        .session
        .and_then(|session| session.pieces.get(index_of(&session, &piece)?).map(|p| p.locked))
        .unwrap_or(false);
    Ok(locked)
}

fn index_of(session: &SessionSnapshot, piece: &PieceSnapshot) -> Option<usize> {
    session
        .pieces
        .iter()
        .position(|candidate| candidate.row == piece.row && candidate.col == piece.col)
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
