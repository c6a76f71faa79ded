pub mod action;
pub mod catalog;
pub mod confetti;
pub mod countdown;
pub mod edges;
pub mod game;
pub mod grid;
pub mod path;
pub mod rules;
pub mod scatter;
pub mod snapshot;

pub use action::{PointerInput, PointerPhase, SettingsAction};
pub use catalog::{BoundaryKind, CatalogError, Stage, StageCatalog};
pub use confetti::{ConfettiField, Particle};
pub use countdown::{format_clock, Countdown, CountdownTick};
pub use edges::{EdgeSigns, TabMap, TabSide};
pub use game::{DropOutcome, Piece, PointerOutcome, PuzzleSession, SnapKind};
pub use grid::{
    compute_grid_layout, compute_source_crop, compute_target_bounds, grid_label, GridLayout,
    ImageLoad, Rect, SourceImage, Viewport,
};
pub use path::{build_piece_path, PiecePath, PieceShape, Segment};
pub use rules::{GameRules, SessionSettings};
pub use scatter::{scatter_position, ScatterBand, ScatterOrigin, ScatterPosition};
pub use snapshot::{PieceSnapshot, SessionSnapshot};
