use serde::{Deserialize, Serialize};

use crate::catalog::BoundaryKind;
use crate::edges::EdgeSigns;
use crate::game::{Piece, PuzzleSession};
use crate::grid::{Rect, SourceImage};

pub const SESSION_SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub row: u32,
    pub col: u32,
    pub x: f32,
    pub y: f32,
    pub correct_x: f32,
    pub correct_y: f32,
    pub width: f32,
    pub height: f32,
    pub signs: EdgeSigns,
    pub locked: bool,
    pub z_index: u32,
    /// SVG path data in piece-local coordinates.
    pub outline: String,
}

impl From<&Piece> for PieceSnapshot {
    fn from(piece: &Piece) -> Self {
        Self {
            row: piece.row,
            col: piece.col,
            x: piece.x,
            y: piece.y,
            correct_x: piece.correct_x,
            correct_y: piece.correct_y,
            width: piece.width,
            height: piece.height,
            signs: piece.signs,
            locked: piece.locked,
            z_index: piece.z_index,
            outline: piece.shape.outline().svg_data(),
        }
    }
}

/// Read-only view of a session handed to renderers and tooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub rows: u32,
    pub cols: u32,
    pub kind: BoundaryKind,
    pub target_bounds: Rect,
    pub source_crop: Rect,
    /// Natural size of the stage image; `None` in placeholder mode.
    pub image: Option<SourceImage>,
    pub dragging: Option<usize>,
    pub complete: bool,
    pub pieces: Vec<PieceSnapshot>,
}

impl SessionSnapshot {
    pub fn capture(session: &PuzzleSession) -> Self {
        let layout = session.layout();
        Self {
            version: SESSION_SNAPSHOT_VERSION,
            rows: layout.rows,
            cols: layout.cols,
            kind: session.kind(),
            target_bounds: session.target_bounds(),
            source_crop: session.source_crop(),
            image: session.image().image(),
            dragging: session.dragging(),
            complete: session.is_complete(),
            pieces: session.pieces().iter().map(PieceSnapshot::from).collect(),
        }
    }

    pub fn locked_count(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.locked).count()
    }

    /// Piece indices in paint order: ascending z-index, ties in array order.
    pub fn render_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.pieces.len()).collect();
        order.sort_by_key(|&index| self.pieces[index].z_index);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ImageLoad, Viewport};
    use crate::rules::GameRules;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn snapshot_serializes_every_piece() {
        let mut rng = StdRng::seed_from_u64(17);
        let session = PuzzleSession::generate(
            2,
            3,
            BoundaryKind::Jigsaw,
            Viewport::new(900.0, 700.0, 110.0),
            ImageLoad::Loaded(SourceImage {
                width: 640,
                height: 480,
            }),
            GameRules::default(),
            &mut rng,
        );
        let snapshot = SessionSnapshot::capture(&session);
        assert_eq!(snapshot.pieces.len(), 6);
        assert_eq!(
            snapshot.image,
            Some(SourceImage {
                width: 640,
                height: 480
            })
        );
        assert_eq!(snapshot.locked_count(), 0);
        assert!(snapshot.pieces.iter().all(|piece| piece.outline.ends_with('Z')));

        let json = serde_json::to_string(&snapshot).expect("serialize");
        let back: SessionSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.kind, BoundaryKind::Jigsaw);
        assert_eq!(back.pieces[4].row, 1);
        assert_eq!(back.pieces[4].col, 1);
    }
}
