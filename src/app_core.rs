use std::cell::RefCell;
use std::rc::Rc;

use puzzlegift_core::{
    grid_label, ConfettiField, Countdown, CountdownTick, DropOutcome, GameRules, ImageLoad,
    Particle, PointerInput, PointerOutcome, PointerPhase, PuzzleSession, SessionSettings,
    SessionSnapshot, SettingsAction, Stage, StageCatalog, Viewport,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub type AppSubscriber = Rc<dyn Fn()>;
pub type EventHook = Rc<dyn Fn(StageEvent)>;

/// Notifications for the surrounding UI (modals, timer pill, progress bar).
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    StageLoaded {
        index: usize,
        title: String,
        subtitle: String,
        rows: u32,
        cols: u32,
        image: bool,
    },
    TimeLeft {
        index: usize,
        seconds: u32,
    },
    StageComplete {
        index: usize,
    },
    StageTimeout {
        index: usize,
    },
    AllStagesComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagePhase {
    Idle,
    Loading,
    Playing,
    Solved,
    /// Time ran out; pieces can still be placed.
    TimedOut,
    Finished,
}

/// Work the task runtime must start or cancel after a state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskCommand {
    StartCountdown { epoch: u64 },
    StopCountdown,
    StartConfetti { epoch: u64 },
    ScheduleCompleteNotice { epoch: u64 },
    CancelStageTasks,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StageLoad {
    Pending {
        epoch: u64,
        index: usize,
        stage: Stage,
    },
    /// Past the last stage; the final reveal was announced.
    Finished,
}

/// Outcome of fetching a stage image.
#[derive(Clone, Debug, PartialEq)]
pub struct StageAsset {
    pub load: ImageLoad,
    /// Where a renderer can fetch the pixels, e.g. a data URL.
    pub href: Option<String>,
}

impl StageAsset {
    pub fn failed() -> Self {
        Self {
            load: ImageLoad::Failed,
            href: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: StageCatalog,
    pub settings: SessionSettings,
    pub rules: GameRules,
    pub width: f32,
    pub height: f32,
    pub seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: StageCatalog::default(),
            settings: SessionSettings::default(),
            rules: GameRules::default(),
            width: 1280.0,
            height: 800.0,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub epoch: u64,
    pub stage_index: usize,
    pub stage_count: usize,
    pub progress: f32,
    pub phase: StagePhase,
    pub title: String,
    pub subtitle: String,
    pub viewport: Viewport,
    pub session: Option<SessionSnapshot>,
    pub time_left: Option<u32>,
    pub hint: bool,
    pub image_href: Option<String>,
    pub confetti: Vec<Particle>,
    pub settings: SessionSettings,
    pub settings_label: String,
}

impl AppSnapshot {
    pub fn clock(&self) -> Option<String> {
        self.time_left.map(puzzlegift_core::format_clock)
    }
}

struct AppState {
    catalog: StageCatalog,
    settings: SessionSettings,
    rules: GameRules,
    viewport: Viewport,
    stage_index: usize,
    epoch: u64,
    phase: StagePhase,
    session: Option<PuzzleSession>,
    image_href: Option<String>,
    countdown: Option<Countdown>,
    confetti: ConfettiField,
    hint: bool,
    rng: StdRng,
}

impl AppState {
    fn new(config: AppConfig) -> Self {
        let viewport = Viewport::new(config.width, config.height, config.rules.header_height);
        Self {
            catalog: config.catalog,
            settings: config.settings,
            rules: config.rules,
            viewport,
            stage_index: 0,
            epoch: 0,
            phase: StagePhase::Idle,
            session: None,
            image_href: None,
            countdown: None,
            confetti: ConfettiField::default(),
            hint: false,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn current_stage(&self) -> Option<&Stage> {
        self.catalog.stage(self.stage_index)
    }

    fn settings_label(&self) -> String {
        match self.current_stage() {
            Some(stage) => {
                let (rows, cols) = stage.grid_size(&self.settings);
                grid_label(rows, cols)
            }
            None => String::new(),
        }
    }
}

/// Stage controller. Owns the live puzzle session and everything scoped to
/// the current stage; periodic work is driven from outside by epoch.
pub struct AppCore {
    state: RefCell<AppState>,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
    event_hook: RefCell<Option<EventHook>>,
}

impl AppCore {
    pub fn new(config: AppConfig) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(AppState::new(config)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
            event_hook: RefCell::new(None),
        })
    }

    pub fn subscribe(&self, subscriber: AppSubscriber) -> AppSubscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        AppSubscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    pub fn set_event_hook(&self, hook: Option<EventHook>) {
        *self.event_hook.borrow_mut() = hook;
    }

    fn notify(&self) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }

    fn emit(&self, event: StageEvent) {
        let hook = self.event_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(event);
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let state = self.state.borrow();
        let (title, subtitle) = state
            .current_stage()
            .map(|stage| (stage.title.clone(), stage.subtitle.clone()))
            .unwrap_or_default();
        AppSnapshot {
            epoch: state.epoch,
            stage_index: state.stage_index,
            stage_count: state.catalog.len(),
            progress: state.catalog.progress(state.stage_index),
            phase: state.phase,
            title,
            subtitle,
            viewport: state.viewport,
            session: state.session.as_ref().map(SessionSnapshot::capture),
            time_left: state
                .countdown
                .filter(|countdown| countdown.is_running())
                .map(|countdown| countdown.remaining()),
            hint: state.hint,
            image_href: state.image_href.clone(),
            confetti: state.confetti.particles().to_vec(),
            settings: state.settings,
            settings_label: state.settings_label(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    pub fn phase(&self) -> StagePhase {
        self.state.borrow().phase
    }

    pub fn stage_index(&self) -> usize {
        self.state.borrow().stage_index
    }

    pub fn settings(&self) -> SessionSettings {
        self.state.borrow().settings
    }

    pub fn rules(&self) -> GameRules {
        self.state.borrow().rules
    }

    /// Starts loading stage `index`, discarding the previous session. Every
    /// stage-scoped task must be cancelled before the new stage starts its own.
    pub fn begin_stage_load(&self, index: usize) -> StageLoad {
        let result = {
            let mut state = self.state.borrow_mut();
            state.epoch += 1;
            state.session = None;
            state.image_href = None;
            state.countdown = None;
            state.confetti.stop();
            if index >= state.catalog.len() {
                state.phase = StagePhase::Finished;
                state.stage_index = state.catalog.len();
                StageLoad::Finished
            } else {
                state.stage_index = index;
                state.phase = StagePhase::Loading;
                let stage = state.catalog.stages[index].clone();
                StageLoad::Pending {
                    epoch: state.epoch,
                    index,
                    stage,
                }
            }
        };
        match &result {
            StageLoad::Finished => {
                log::info!("all stages complete");
                self.emit(StageEvent::AllStagesComplete);
            }
            StageLoad::Pending { index, stage, .. } => {
                log::info!("loading stage {} '{}'", index, stage.title);
            }
        }
        self.notify();
        result
    }

    /// Builds the puzzle for a pending load. Stale results are dropped.
    pub fn finish_stage_load(&self, epoch: u64, asset: StageAsset) -> Vec<TaskCommand> {
        let event = {
            let mut state = self.state.borrow_mut();
            if state.epoch != epoch || state.phase != StagePhase::Loading {
                log::debug!("dropping stale stage load for epoch {epoch}");
                return Vec::new();
            }
            let Some(stage) = state.current_stage().cloned() else {
                return Vec::new();
            };
            let (rows, cols) = stage.grid_size(&state.settings);
            let viewport = state.viewport;
            let rules = state.rules;
            if asset.load == ImageLoad::Failed {
                log::warn!("stage {} image unavailable, using placeholder fill", state.stage_index);
            }
            let session = PuzzleSession::generate(
                rows,
                cols,
                stage.kind,
                viewport,
                asset.load,
                rules,
                &mut state.rng,
            );
            state.session = Some(session);
            state.image_href = asset.href;
            state.countdown = Some(Countdown::start(state.settings.time_per_stage()));
            state.phase = StagePhase::Playing;
            StageEvent::StageLoaded {
                index: state.stage_index,
                title: stage.title,
                subtitle: stage.subtitle,
                rows,
                cols,
                image: asset.load.image().is_some(),
            }
        };
        let (index, seconds) = {
            let state = self.state.borrow();
            (
                state.stage_index,
                state.countdown.map(|c| c.remaining()).unwrap_or_default(),
            )
        };
        self.emit(event);
        self.emit(StageEvent::TimeLeft { index, seconds });
        self.notify();
        vec![TaskCommand::StartCountdown { epoch }]
    }

    pub fn pointer(&self, input: PointerInput) -> Vec<TaskCommand> {
        let (changed, completed) = {
            let mut state = self.state.borrow_mut();
            if !matches!(state.phase, StagePhase::Playing | StagePhase::TimedOut) {
                return Vec::new();
            }
            let Some(session) = state.session.as_mut() else {
                return Vec::new();
            };
            match input.phase {
                PointerPhase::Start => (
                    session.pointer_down(input.x, input.y) != PointerOutcome::Ignored,
                    false,
                ),
                PointerPhase::Move => (
                    session.pointer_move(input.x, input.y) != PointerOutcome::Ignored,
                    false,
                ),
                PointerPhase::End => {
                    let outcome = session.pointer_up();
                    (outcome != DropOutcome::Ignored, outcome.completed())
                }
                PointerPhase::Cancel => (session.cancel_drag() != DropOutcome::Ignored, false),
            }
        };
        if !changed {
            return Vec::new();
        }
        let commands = if completed { self.complete_stage() } else { Vec::new() };
        self.notify();
        commands
    }

    fn complete_stage(&self) -> Vec<TaskCommand> {
        let mut state = self.state.borrow_mut();
        let AppState {
            phase,
            countdown,
            confetti,
            rng,
            viewport,
            epoch,
            stage_index,
            ..
        } = &mut *state;
        *phase = StagePhase::Solved;
        if let Some(countdown) = countdown.as_mut() {
            countdown.stop();
        }
        confetti.start(rng, viewport.width, viewport.height);
        log::info!("stage {stage_index} solved");
        vec![
            TaskCommand::StopCountdown,
            TaskCommand::StartConfetti { epoch: *epoch },
            TaskCommand::ScheduleCompleteNotice { epoch: *epoch },
        ]
    }

    /// One countdown period elapsed. Returns whether the countdown keeps running.
    pub fn countdown_tick(&self, epoch: u64) -> bool {
        let (index, tick) = {
            let mut state = self.state.borrow_mut();
            if state.epoch != epoch {
                return false;
            }
            let index = state.stage_index;
            let Some(tick) = state.countdown.as_mut().and_then(Countdown::tick) else {
                return false;
            };
            if tick == CountdownTick::Expired && state.phase == StagePhase::Playing {
                state.phase = StagePhase::TimedOut;
            }
            (index, tick)
        };
        match tick {
            CountdownTick::Remaining(seconds) => {
                self.emit(StageEvent::TimeLeft { index, seconds });
                self.notify();
                true
            }
            CountdownTick::Expired => {
                log::info!("stage {index} timed out");
                self.emit(StageEvent::TimeLeft { index, seconds: 0 });
                self.emit(StageEvent::StageTimeout { index });
                self.notify();
                false
            }
        }
    }

    /// Advances the particle field one frame. Returns whether it is still live.
    pub fn confetti_frame(&self, epoch: u64) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.epoch != epoch || !state.confetti.is_active() {
                return false;
            }
            let AppState { confetti, rng, .. } = &mut *state;
            confetti.step(rng);
        }
        self.notify();
        true
    }

    /// Fires once the post-solve delay elapses.
    pub fn complete_notice(&self, epoch: u64) {
        let index = {
            let state = self.state.borrow();
            if state.epoch != epoch || state.phase != StagePhase::Solved {
                return;
            }
            state.stage_index
        };
        self.emit(StageEvent::StageComplete { index });
    }

    pub fn next_stage(&self) -> StageLoad {
        let next = self.stage_index() + 1;
        self.begin_stage_load(next)
    }

    pub fn retry_stage(&self) -> StageLoad {
        let current = self.stage_index();
        self.begin_stage_load(current)
    }

    pub fn set_hint(&self, show: bool) {
        {
            let mut state = self.state.borrow_mut();
            if state.hint == show {
                return;
            }
            state.hint = show;
        }
        self.notify();
    }

    /// Resizes the canvas. The live puzzle keeps its layout; the next stage
    /// load uses the new size.
    pub fn set_viewport(&self, width: f32, height: f32) {
        {
            let mut state = self.state.borrow_mut();
            let header = state.rules.header_height;
            state.viewport = Viewport::new(width, height, header);
            let (vw, vh) = (state.viewport.width, state.viewport.height);
            state.confetti.resize(vw, vh);
        }
        self.notify();
    }

    /// Applies a settings step and returns the refreshed grid label.
    pub fn apply_settings(&self, action: SettingsAction) -> String {
        let label = {
            let mut state = self.state.borrow_mut();
            match action {
                SettingsAction::TimeStep(steps) => state.settings.adjust_time(steps),
                SettingsAction::GridStep(steps) => state.settings.adjust_grid(steps),
            }
            state.settings_label()
        };
        self.notify();
        label
    }

    pub fn settings_label(&self) -> String {
        self.state.borrow().settings_label()
    }
}

pub struct AppSubscription {
    subscriber: AppSubscriber,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
}

impl Drop for AppSubscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}
