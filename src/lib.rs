pub mod app_core;
pub mod renderer;
pub mod runtime;
pub mod svg_view;

pub use app_core::{
    AppConfig, AppCore, AppSnapshot, AppSubscription, StageAsset, StageEvent, StageLoad,
    StagePhase, TaskCommand,
};
pub use renderer::{build_render_plan, DrawCommand, PieceClip, PieceDraw, PieceFill, RenderPlan};
pub use runtime::{
    attach_view, DirectoryAssets, GameView, PlaceholderAssets, StageAssets, StageRuntime,
    ViewHooks,
};
pub use svg_view::{render_snapshot_svg, render_svg, SvgView};
