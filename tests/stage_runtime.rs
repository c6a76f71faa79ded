use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use puzzlegift::{
    attach_view, build_render_plan, AppConfig, AppCore, DrawCommand, PieceFill,
    PlaceholderAssets, StageAsset, StageAssets, StageEvent, StageLoad, StagePhase, StageRuntime,
    SvgView,
};
use puzzlegift::renderer::{HINT_ALPHA, LOCKED_STROKE};
use puzzlegift_core::{ImageLoad, PointerInput, SessionSettings, SourceImage, Stage};
use tokio::task::LocalSet;
use tokio::time::sleep;

struct FixedAssets;

impl StageAssets for FixedAssets {
    fn load(&self, index: usize, _stage: &Stage) -> StageAsset {
        StageAsset {
            load: ImageLoad::Loaded(SourceImage {
                width: 1600,
                height: 1200,
            }),
            href: Some(format!("stage_{}.png", index + 1)),
        }
    }
}

fn runtime_with(settings: SessionSettings, assets: Rc<dyn StageAssets>) -> Rc<StageRuntime> {
    let core = AppCore::new(AppConfig {
        settings,
        seed: 11,
        ..AppConfig::default()
    });
    StageRuntime::new(core, assets)
}

fn record(core: &AppCore) -> Rc<RefCell<Vec<StageEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    core.set_event_hook(Some(Rc::new(move |event| sink.borrow_mut().push(event))));
    events
}

fn seconds_reported(events: &[StageEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            StageEvent::TimeLeft { seconds, .. } => Some(*seconds),
            _ => None,
        })
        .collect()
}

/// Drags every piece next to its slot through the runtime's pointer path.
fn solve(runtime: &StageRuntime) {
    let mut guard = 0;
    loop {
        guard += 1;
        assert!(guard < 1_000, "solver made no progress");
        let session = runtime.core().snapshot().session.expect("session");
        if session.complete {
            break;
        }
        let free = session
            .pieces
            .iter()
            .find(|piece| !piece.locked)
            .expect("a free piece");
        let (px, py) = (free.x + free.width * 0.5, free.y + free.height * 0.5);
        runtime.pointer(PointerInput::start(px, py));
        let session = runtime.core().snapshot().session.expect("session");
        let index = session.dragging.expect("a piece was picked");
        let piece = &session.pieces[index];
        let (dx, dy) = (px - piece.x, py - piece.y);
        let (tx, ty) = (piece.correct_x + 5.0 + dx, piece.correct_y - 3.0 + dy);
        runtime.pointer(PointerInput::moved(tx, ty));
        runtime.pointer(PointerInput::end(tx, ty));
    }
}

#[tokio::test(start_paused = true)]
async fn countdown_runs_down_to_timeout() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::new(10, 1.0), Rc::new(PlaceholderAssets));
            let events = record(runtime.core());
            let load = runtime.load_stage(0).await;
            assert!(matches!(load, StageLoad::Pending { index: 0, .. }));
            assert_eq!(runtime.running_tasks(), 1);

            sleep(Duration::from_millis(10_500)).await;

            let events = events.borrow();
            assert_eq!(
                seconds_reported(&events),
                vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]
            );
            assert_eq!(events.last(), Some(&StageEvent::StageTimeout { index: 0 }));
            assert_eq!(runtime.core().phase(), StagePhase::TimedOut);
            assert_eq!(runtime.core().snapshot().time_left, None);
            assert_eq!(runtime.running_tasks(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn retry_replaces_the_running_countdown() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::new(30, 1.0), Rc::new(PlaceholderAssets));
            let events = record(runtime.core());
            runtime.load_stage(2).await;
            sleep(Duration::from_millis(3_500)).await;
            assert_eq!(runtime.core().snapshot().clock().as_deref(), Some("00:27"));

            events.borrow_mut().clear();
            runtime.retry_stage().await;
            assert_eq!(runtime.core().stage_index(), 2);
            sleep(Duration::from_millis(2_200)).await;

            assert_eq!(seconds_reported(&events.borrow()), vec![30, 29, 28]);
            assert_eq!(runtime.running_tasks(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn solving_stops_the_clock_and_delays_the_notice() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::default(), Rc::new(PlaceholderAssets));
            let events = record(runtime.core());
            runtime.load_stage(0).await;
            sleep(Duration::from_millis(1_100)).await;

            solve(&runtime);
            let snapshot = runtime.core().snapshot();
            assert_eq!(snapshot.phase, StagePhase::Solved);
            assert_eq!(snapshot.time_left, None);
            assert_eq!(snapshot.confetti.len(), 80);
            assert_eq!(runtime.running_tasks(), 2);

            sleep(Duration::from_millis(790)).await;
            assert!(!events
                .borrow()
                .contains(&StageEvent::StageComplete { index: 0 }));
            sleep(Duration::from_millis(20)).await;
            assert_eq!(
                events
                    .borrow()
                    .iter()
                    .filter(|event| matches!(event, StageEvent::StageComplete { .. }))
                    .count(),
                1
            );
            assert_eq!(seconds_reported(&events.borrow()), vec![60, 59]);

            let before = runtime.core().snapshot().confetti[0].y;
            sleep(Duration::from_millis(100)).await;
            assert_ne!(runtime.core().snapshot().confetti[0].y, before);

            runtime.next_stage().await;
            let snapshot = runtime.core().snapshot();
            assert_eq!(snapshot.stage_index, 1);
            assert!(snapshot.confetti.is_empty());
            assert_eq!(runtime.running_tasks(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn advancing_past_the_last_stage_reveals_the_finale() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::default(), Rc::new(PlaceholderAssets));
            let events = record(runtime.core());
            runtime.load_stage(4).await;
            assert_eq!(runtime.running_tasks(), 1);
            assert_eq!(runtime.next_stage().await, StageLoad::Finished);
            assert_eq!(runtime.core().phase(), StagePhase::Finished);
            assert_eq!(events.borrow().last(), Some(&StageEvent::AllStagesComplete));
            assert_eq!(runtime.running_tasks(), 0);
            assert!(runtime.core().snapshot().session.is_none());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn render_plan_layers_and_strokes() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::default(), Rc::new(FixedAssets));
            runtime.load_stage(0).await;
            runtime.core().set_hint(true);

            let plan = build_render_plan(&runtime.core().snapshot());
            assert!(matches!(plan.commands[0], DrawCommand::TargetOutline { .. }));
            assert!(matches!(
                plan.commands[1],
                DrawCommand::Hint { alpha, .. } if alpha == HINT_ALPHA
            ));
            assert_eq!(plan.pieces().count(), 16);
            assert!(plan
                .pieces()
                .all(|piece| matches!(piece.fill, PieceFill::Image { .. })));

            let session = runtime.core().snapshot().session.expect("session");
            let piece = &session.pieces[5];
            let (px, py) = (piece.x + piece.width * 0.5, piece.y + piece.height * 0.5);
            runtime.pointer(PointerInput::start(px, py));
            let picked = runtime
                .core()
                .snapshot()
                .session
                .and_then(|session| session.dragging)
                .expect("picked");
            let plan = build_render_plan(&runtime.core().snapshot());
            assert_eq!(plan.pieces().last().map(|piece| piece.index), Some(picked));

            let session = runtime.core().snapshot().session.expect("session");
            let target = &session.pieces[picked];
            let (dx, dy) = (px - target.x, py - target.y);
            let (tx, ty) = (target.correct_x + dx, target.correct_y + dy);
            runtime.pointer(PointerInput::moved(tx, ty));
            runtime.pointer(PointerInput::end(tx, ty));
            let plan = build_render_plan(&runtime.core().snapshot());
            let locked = plan
                .pieces()
                .find(|piece| piece.index == picked)
                .expect("locked piece drawn");
            assert_eq!(locked.stroke, LOCKED_STROKE);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn attached_svg_view_follows_the_core() {
    LocalSet::new()
        .run_until(async {
            let runtime = runtime_with(SessionSettings::default(), Rc::new(PlaceholderAssets));
            let (view, _subscription) = attach_view(&runtime, SvgView::new());
            runtime.load_stage(0).await;

            let frames = view.borrow().frames();
            assert!(frames > 0);
            let document = view.borrow().document().map(str::to_owned).expect("document");
            assert!(document.contains(r#"<clipPath id="piece-clip-15">"#));
            assert!(document.contains(">3,3</text>"));

            let on_input = view.borrow().hooks().expect("hooks").on_input.clone();
            let piece = runtime.core().snapshot().session.expect("session").pieces[0].clone();
            on_input(PointerInput::start(piece.x + 1.0, piece.y + 1.0));
            assert!(runtime
                .core()
                .snapshot()
                .session
                .and_then(|session| session.dragging)
                .is_some());
            assert!(view.borrow().frames() > frames);

            sleep(Duration::from_millis(1_000)).await;
            assert!(runtime.core().snapshot().clock().as_deref() == Some("00:59"));
        })
        .await;
}
