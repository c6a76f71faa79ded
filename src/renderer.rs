use puzzlegift_core::{BoundaryKind, PieceSnapshot, Rect, SourceImage};

use crate::app_core::AppSnapshot;

pub const HINT_ALPHA: f32 = 0.35;
pub const TARGET_OUTLINE_COLOR: &str = "rgba(255, 255, 255, 0.3)";
pub const TARGET_OUTLINE_DASH: [f32; 2] = [10.0, 5.0];
pub const OUTLINE_WIDTH: f32 = 2.0;
pub const LOCKED_STROKE: &str = "#333";
pub const FREE_STROKE: &str = "#fff";
pub const PLACEHOLDER_LABEL_OFFSET: (f32, f32) = (10.0, 20.0);

#[derive(Clone, Debug, PartialEq)]
pub enum PieceClip {
    Rect { width: f32, height: f32 },
    /// SVG path data in piece-local coordinates.
    Path(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum PieceFill {
    /// The whole source crop, positioned so the piece's slot in the solved
    /// picture lands on the piece origin.
    Image {
        dx: f32,
        dy: f32,
        width: f32,
        height: f32,
        crop: Rect,
        source: SourceImage,
    },
    Placeholder { color: String, label: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PieceDraw {
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub x: f32,
    pub y: f32,
    pub clip: PieceClip,
    pub fill: PieceFill,
    pub stroke: &'static str,
    pub stroke_width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    TargetOutline {
        bounds: Rect,
        color: &'static str,
        width: f32,
        dash: [f32; 2],
    },
    Hint {
        bounds: Rect,
        crop: Rect,
        source: SourceImage,
        alpha: f32,
    },
    Particle {
        x: f32,
        y: f32,
        size: f32,
        color: String,
    },
    Piece(PieceDraw),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl RenderPlan {
    pub fn pieces(&self) -> impl Iterator<Item = &PieceDraw> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Piece(piece) => Some(piece),
            _ => None,
        })
    }
}

pub fn placeholder_color(row: u32, col: u32) -> String {
    format!("hsl({}, 70%, 50%)", row * 50 + col * 50)
}

/// Paint order for one frame: target outline, optional hint, particles, then
/// pieces by ascending z-index.
pub fn build_render_plan(snapshot: &AppSnapshot) -> RenderPlan {
    let mut plan = RenderPlan {
        width: snapshot.viewport.width,
        height: snapshot.viewport.height,
        commands: Vec::new(),
    };
    let Some(session) = snapshot.session.as_ref() else {
        plan.commands.extend(particles(snapshot));
        return plan;
    };
    let bounds = session.target_bounds;
    plan.commands.push(DrawCommand::TargetOutline {
        bounds,
        color: TARGET_OUTLINE_COLOR,
        width: OUTLINE_WIDTH,
        dash: TARGET_OUTLINE_DASH,
    });
    if let Some(source) = session.image.filter(|_| snapshot.hint && !session.pieces.is_empty()) {
        plan.commands.push(DrawCommand::Hint {
            bounds,
            crop: session.source_crop,
            source,
            alpha: HINT_ALPHA,
        });
    }
    plan.commands.extend(particles(snapshot));

    for index in session.render_order() {
        let piece = &session.pieces[index];
        plan.commands.push(DrawCommand::Piece(piece_draw(
            index,
            piece,
            session.kind,
            session.image,
            bounds,
            session.source_crop,
        )));
    }
    plan
}

fn particles(snapshot: &AppSnapshot) -> impl Iterator<Item = DrawCommand> + '_ {
    snapshot.confetti.iter().map(|particle| DrawCommand::Particle {
        x: particle.x,
        y: particle.y,
        size: particle.size,
        color: particle.color(),
    })
}

fn piece_draw(
    index: usize,
    piece: &PieceSnapshot,
    kind: BoundaryKind,
    image: Option<SourceImage>,
    bounds: Rect,
    crop: Rect,
) -> PieceDraw {
    let clip = match kind {
        BoundaryKind::Grid => PieceClip::Rect {
            width: piece.width,
            height: piece.height,
        },
        BoundaryKind::Jigsaw => PieceClip::Path(piece.outline.clone()),
    };
    let fill = match image {
        Some(source) => PieceFill::Image {
            dx: -(piece.correct_x - bounds.x),
            dy: -(piece.correct_y - bounds.y),
            width: bounds.w,
            height: bounds.h,
            crop,
            source,
        },
        None => PieceFill::Placeholder {
            color: placeholder_color(piece.row, piece.col),
            label: format!("{},{}", piece.row, piece.col),
        },
    };
    PieceDraw {
        index,
        row: piece.row,
        col: piece.col,
        x: piece.x,
        y: piece.y,
        clip,
        fill,
        stroke: if piece.locked { LOCKED_STROKE } else { FREE_STROKE },
        stroke_width: OUTLINE_WIDTH,
    }
}
