use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use puzzlegift_core::{ImageLoad, PointerInput, SourceImage, Stage};
use puzzlegift_image_pipeline::ImagePipeline;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::app_core::{AppCore, AppSnapshot, StageAsset, StageLoad, TaskCommand};

#[derive(Clone)]
pub struct ViewHooks {
    pub on_input: Rc<dyn Fn(PointerInput)>,
}

pub trait GameView {
    fn init(&mut self, hooks: ViewHooks);
    fn render(&mut self, snapshot: &AppSnapshot);
    fn shutdown(&mut self);
}

/// Source of stage artwork. Failures are reported as `ImageLoad::Failed`.
pub trait StageAssets {
    fn load(&self, index: usize, stage: &Stage) -> StageAsset;
}

/// Every stage renders with placeholder fills.
pub struct PlaceholderAssets;

impl StageAssets for PlaceholderAssets {
    fn load(&self, _index: usize, _stage: &Stage) -> StageAsset {
        StageAsset::failed()
    }
}

/// Loads `stage.image` relative to a directory through the image pipeline.
pub struct DirectoryAssets {
    root: PathBuf,
    pipeline: ImagePipeline,
    embed: bool,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>, pipeline: ImagePipeline) -> Self {
        Self {
            root: root.into(),
            pipeline,
            embed: true,
        }
    }

    /// Skip encoding a data URL when only dimensions are needed.
    pub fn without_embedding(mut self) -> Self {
        self.embed = false;
        self
    }
}

impl StageAssets for DirectoryAssets {
    fn load(&self, index: usize, stage: &Stage) -> StageAsset {
        let Some(name) = stage.image.as_deref() else {
            log::warn!("stage {index} has no image configured");
            return StageAsset::failed();
        };
        let path = self.root.join(name);
        let image = match self.pipeline.load(&path) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("stage {index} image failed to load: {err}");
                return StageAsset::failed();
            }
        };
        let href = if self.embed {
            match image.to_png_data_url() {
                Ok(url) => Some(url),
                Err(err) => {
                    log::warn!("stage {index} image could not be embedded: {err}");
                    None
                }
            }
        } else {
            None
        };
        StageAsset {
            load: ImageLoad::Loaded(SourceImage {
                width: image.width,
                height: image.height,
            }),
            href,
        }
    }
}

#[derive(Default)]
struct StageTasks {
    countdown: Option<JoinHandle<()>>,
    confetti: Option<JoinHandle<()>>,
    notice: Option<JoinHandle<()>>,
}

impl StageTasks {
    fn cancel(slot: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        Self::cancel(&mut self.countdown);
        Self::cancel(&mut self.confetti);
        Self::cancel(&mut self.notice);
    }

    fn running(&self) -> usize {
        [&self.countdown, &self.confetti, &self.notice]
            .into_iter()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

/// Drives an `AppCore` on a tokio `LocalSet`: loads stages and owns the
/// countdown, particle and completion-notice tasks of the current stage.
pub struct StageRuntime {
    core: Rc<AppCore>,
    assets: Rc<dyn StageAssets>,
    tasks: RefCell<StageTasks>,
}

impl StageRuntime {
    pub fn new(core: Rc<AppCore>, assets: Rc<dyn StageAssets>) -> Rc<Self> {
        Rc::new(Self {
            core,
            assets,
            tasks: RefCell::new(StageTasks::default()),
        })
    }

    pub fn core(&self) -> &Rc<AppCore> {
        &self.core
    }

    /// Number of stage tasks still alive.
    pub fn running_tasks(&self) -> usize {
        self.tasks.borrow().running()
    }

    pub async fn load_stage(&self, index: usize) -> StageLoad {
        let load = self.core.begin_stage_load(index);
        self.finish(load).await
    }

    pub async fn next_stage(&self) -> StageLoad {
        let load = self.core.next_stage();
        self.finish(load).await
    }

    pub async fn retry_stage(&self) -> StageLoad {
        let load = self.core.retry_stage();
        self.finish(load).await
    }

    async fn finish(&self, load: StageLoad) -> StageLoad {
        self.apply(vec![TaskCommand::CancelStageTasks]);
        let (epoch, index, stage) = match &load {
            StageLoad::Pending {
                epoch,
                index,
                stage,
            } => (*epoch, *index, stage.clone()),
            StageLoad::Finished => return load,
        };
        // Let the view show the loading state before decoding.
        tokio::task::yield_now().await;
        let asset = self.assets.load(index, &stage);
        let commands = self.core.finish_stage_load(epoch, asset);
        self.apply(commands);
        load
    }

    pub fn pointer(&self, input: PointerInput) {
        let commands = self.core.pointer(input);
        self.apply(commands);
    }

    pub fn shutdown(&self) {
        self.tasks.borrow_mut().cancel_all();
    }

    fn apply(&self, commands: Vec<TaskCommand>) {
        for command in commands {
            match command {
                TaskCommand::StartCountdown { epoch } => self.start_countdown(epoch),
                TaskCommand::StopCountdown => {
                    StageTasks::cancel(&mut self.tasks.borrow_mut().countdown);
                }
                TaskCommand::StartConfetti { epoch } => self.start_confetti(epoch),
                TaskCommand::ScheduleCompleteNotice { epoch } => self.schedule_notice(epoch),
                TaskCommand::CancelStageTasks => self.tasks.borrow_mut().cancel_all(),
            }
        }
    }

    fn start_countdown(&self, epoch: u64) {
        let period = Duration::from_millis(self.core.rules().countdown_period_ms.max(1));
        let core = Rc::clone(&self.core);
        let handle = tokio::task::spawn_local(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !core.countdown_tick(epoch) {
                    break;
                }
            }
        });
        let mut tasks = self.tasks.borrow_mut();
        StageTasks::cancel(&mut tasks.countdown);
        tasks.countdown = Some(handle);
    }

    fn start_confetti(&self, epoch: u64) {
        let period = Duration::from_millis(self.core.rules().confetti_frame_ms.max(1));
        let core = Rc::clone(&self.core);
        let handle = tokio::task::spawn_local(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !core.confetti_frame(epoch) {
                    break;
                }
            }
        });
        let mut tasks = self.tasks.borrow_mut();
        StageTasks::cancel(&mut tasks.confetti);
        tasks.confetti = Some(handle);
    }

    fn schedule_notice(&self, epoch: u64) {
        let delay = Duration::from_millis(self.core.rules().complete_notice_delay_ms);
        let core = Rc::clone(&self.core);
        let handle = tokio::task::spawn_local(async move {
            time::sleep(delay).await;
            core.complete_notice(epoch);
        });
        let mut tasks = self.tasks.borrow_mut();
        StageTasks::cancel(&mut tasks.notice);
        tasks.notice = Some(handle);
    }
}

impl Drop for StageRuntime {
    fn drop(&mut self) {
        self.tasks.get_mut().cancel_all();
    }
}

/// Connects a view to a runtime: input flows to the runtime, every core
/// change re-renders the view.
pub fn attach_view<V: GameView + 'static>(
    runtime: &Rc<StageRuntime>,
    view: V,
) -> (Rc<RefCell<V>>, crate::app_core::AppSubscription) {
    let view = Rc::new(RefCell::new(view));
    let weak_runtime = Rc::downgrade(runtime);
    view.borrow_mut().init(ViewHooks {
        on_input: Rc::new(move |input| {
            if let Some(runtime) = weak_runtime.upgrade() {
                runtime.pointer(input);
            }
        }),
    });
    let weak_core = Rc::downgrade(runtime.core());
    let weak_view = Rc::downgrade(&view);
    let subscription = runtime.core().subscribe(Rc::new(move || {
        let (Some(core), Some(view)) = (weak_core.upgrade(), weak_view.upgrade()) else {
            return;
        };
        let snapshot = core.snapshot();
        if let Ok(mut view) = view.try_borrow_mut() {
            view.render(&snapshot);
        };
    }));
    (view, subscription)
}
