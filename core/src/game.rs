use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::BoundaryKind;
use crate::edges::{EdgeSigns, TabMap};
use crate::grid::{compute_grid_layout, compute_source_crop, GridLayout, ImageLoad, Rect, Viewport};
use crate::path::PieceShape;
use crate::rules::GameRules;
use crate::scatter::{scatter_position, ScatterOrigin};

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub row: u32,
    pub col: u32,
    pub correct_x: f32,
    pub correct_y: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub signs: EdgeSigns,
    pub shape: PieceShape,
    pub scatter_origin: ScatterOrigin,
    pub locked: bool,
    pub z_index: u32,
}

impl Piece {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Bounding-box hit test; tabs outside the rectangle are not grabbable.
    pub fn hit(&self, x: f32, y: f32) -> bool {
        self.bounds().contains(x, y)
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }

    pub fn is_adjacent(&self, other: &Piece) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr + dc == 1
    }

    /// Where this piece sits when aligned against `other` as it currently is.
    pub fn aligned_to(&self, other: &Piece) -> (f32, f32) {
        let dc = self.col as f32 - other.col as f32;
        let dr = self.row as f32 - other.row as f32;
        (other.x + dc * self.width, other.y + dr * self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapKind {
    Target,
    Neighbor { row: u32, col: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    Picked { index: usize },
    Moved { index: usize },
    /// Nothing grabbed or nothing being dragged; no state changed.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Locked {
        index: usize,
        snap: SnapKind,
        completed: bool,
    },
    Released { index: usize },
    Ignored,
}

impl DropOutcome {
    pub fn completed(&self) -> bool {
        matches!(self, DropOutcome::Locked { completed: true, .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragState {
    index: usize,
    offset_x: f32,
    offset_y: f32,
}

/// Live state of one stage: the generated pieces and the single active drag.
#[derive(Clone, Debug)]
pub struct PuzzleSession {
    layout: GridLayout,
    crop: Rect,
    kind: BoundaryKind,
    image: ImageLoad,
    pieces: Vec<Piece>,
    drag: Option<DragState>,
    z_counter: u32,
    rules: GameRules,
    completed: bool,
}

impl PuzzleSession {
    /// Builds every piece of a rows x cols puzzle. The result depends only on
    /// the inputs and the state of `rng`.
    pub fn generate<R: Rng + ?Sized>(
        rows: u32,
        cols: u32,
        kind: BoundaryKind,
        viewport: Viewport,
        image: ImageLoad,
        rules: GameRules,
        rng: &mut R,
    ) -> Self {
        let layout = compute_grid_layout(viewport, rows, cols);
        let crop = compute_source_crop(image.image(), &layout.target_bounds);
        let tabs = match kind {
            BoundaryKind::Jigsaw => Some(TabMap::generate(layout.rows, layout.cols, rng)),
            BoundaryKind::Grid => None,
        };

        let mut pieces = Vec::with_capacity(layout.total());
        let mut fallbacks = 0usize;
        for row in 0..layout.rows {
            for col in 0..layout.cols {
                let signs = tabs
                    .as_ref()
                    .map(|tabs| tabs.signs_for(row, col))
                    .unwrap_or(EdgeSigns::FLAT);
                let (correct_x, correct_y) = layout.correct_position(row, col);
                let start = scatter_position(rng, viewport, &layout, rules.scatter_margin);
                if start.origin == ScatterOrigin::Fallback {
                    fallbacks += 1;
                }
                pieces.push(Piece {
                    row,
                    col,
                    correct_x,
                    correct_y,
                    x: start.x,
                    y: start.y,
                    width: layout.piece_width,
                    height: layout.piece_height,
                    signs,
                    shape: PieceShape::build(kind, layout.piece_width, layout.piece_height, signs),
                    scatter_origin: start.origin,
                    locked: false,
                    z_index: 0,
                });
            }
        }
        if fallbacks > 0 {
            log::warn!(
                "{fallbacks} of {} pieces used fallback scatter on a {}x{} viewport",
                pieces.len(),
                viewport.width,
                viewport.height
            );
        }
        log::debug!(
            "generated {}x{} {:?} puzzle, piece {}x{}",
            layout.rows,
            layout.cols,
            kind,
            layout.piece_width,
            layout.piece_height
        );

        Self {
            layout,
            crop,
            kind,
            image,
            pieces,
            drag: None,
            z_counter: 0,
            rules,
            completed: false,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn target_bounds(&self) -> Rect {
        self.layout.target_bounds
    }

    pub fn source_crop(&self) -> Rect {
        self.crop
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    pub fn image(&self) -> ImageLoad {
        self.image
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece_at(&self, row: u32, col: u32) -> Option<&Piece> {
        self.index_of(row, col).map(|index| &self.pieces[index])
    }

    pub fn index_of(&self, row: u32, col: u32) -> Option<usize> {
        if row >= self.layout.rows || col >= self.layout.cols {
            return None;
        }
        Some((row * self.layout.cols + col) as usize)
    }

    pub fn dragging(&self) -> Option<usize> {
        self.drag.map(|drag| drag.index)
    }

    pub fn locked_count(&self) -> usize {
        self.pieces.iter().filter(|piece| piece.locked).count()
    }

    pub fn is_complete(&self) -> bool {
        self.pieces.iter().all(|piece| piece.locked)
    }

    /// Highest z-index handed out so far in this session.
    pub fn z_counter(&self) -> u32 {
        self.z_counter
    }

    /// Free piece under the pointer, topmost first; ties keep array order.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        let mut candidates: Vec<usize> = (0..self.pieces.len())
            .filter(|&index| !self.pieces[index].locked)
            .collect();
        candidates.sort_by(|a, b| self.pieces[*b].z_index.cmp(&self.pieces[*a].z_index));
        candidates
            .into_iter()
            .find(|&index| self.pieces[index].hit(x, y))
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> PointerOutcome {
        if self.drag.is_some() {
            return PointerOutcome::Ignored;
        }
        let Some(index) = self.hit_test(x, y) else {
            return PointerOutcome::Ignored;
        };
        self.z_counter += 1;
        let piece = &mut self.pieces[index];
        piece.z_index = self.z_counter;
        self.drag = Some(DragState {
            index,
            offset_x: x - piece.x,
            offset_y: y - piece.y,
        });
        log::debug!("picked piece ({}, {}) z={}", piece.row, piece.col, piece.z_index);
        PointerOutcome::Picked { index }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> PointerOutcome {
        let Some(drag) = self.drag else {
            return PointerOutcome::Ignored;
        };
        let piece = &mut self.pieces[drag.index];
        piece.x = x - drag.offset_x;
        piece.y = y - drag.offset_y;
        PointerOutcome::Moved { index: drag.index }
    }

    /// Ends the drag at the piece's last dragged position and tries to snap.
    pub fn pointer_up(&mut self) -> DropOutcome {
        let Some(drag) = self.drag.take() else {
            return DropOutcome::Ignored;
        };
        let index = drag.index;
        let Some((x, y, snap)) = self.find_snap(index) else {
            let piece = &self.pieces[index];
            log::debug!("released piece ({}, {}) at {:.1},{:.1}", piece.row, piece.col, piece.x, piece.y);
            return DropOutcome::Released { index };
        };

        let piece = &mut self.pieces[index];
        piece.x = x;
        piece.y = y;
        piece.locked = true;
        piece.z_index = 0;
        log::debug!("locked piece ({}, {}) via {:?}", piece.row, piece.col, snap);

        let completed = !self.completed && self.is_complete();
        if completed {
            self.completed = true;
            log::info!("all {} pieces locked", self.pieces.len());
        }
        DropOutcome::Locked {
            index,
            snap,
            completed,
        }
    }

    /// Abandons the active drag without snapping.
    pub fn cancel_drag(&mut self) -> DropOutcome {
        match self.drag.take() {
            Some(drag) => DropOutcome::Released { index: drag.index },
            None => DropOutcome::Ignored,
        }
    }

    fn find_snap(&self, index: usize) -> Option<(f32, f32, SnapKind)> {
        let piece = &self.pieces[index];
        if piece.distance_to(piece.correct_x, piece.correct_y) < self.rules.snap_distance {
            return Some((piece.correct_x, piece.correct_y, SnapKind::Target));
        }
        let radius = self.rules.neighbor_snap_distance();
        self.pieces
            .iter()
            .filter(|other| other.locked && other.is_adjacent(piece))
            .find_map(|other| {
                let (x, y) = piece.aligned_to(other);
                (piece.distance_to(x, y) < radius).then_some((
                    x,
                    y,
                    SnapKind::Neighbor {
                        row: other.row,
                        col: other.col,
                    },
                ))
            })
    }
}
