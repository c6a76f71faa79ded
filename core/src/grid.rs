use serde::{Deserialize, Serialize};

pub const TARGET_SIZE_RATIO: f32 = 0.6;
pub const TARGET_MAX_WIDTH_RATIO: f32 = 0.9;
pub const TARGET_MAX_HEIGHT_RATIO: f32 = 0.8;
pub const PLACEHOLDER_IMAGE_SIZE: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Inclusive on every edge.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn aspect(&self) -> f32 {
        if self.h > 0.0 {
            self.w / self.h
        } else {
            1.0
        }
    }
}

/// Canvas dimensions plus the band reserved for the header overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub header_height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, header_height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            header_height: header_height.max(0.0),
        }
    }
}

/// Natural size of a successfully loaded stage image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
}

/// Result of the asynchronous image load, consumed by puzzle generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageLoad {
    Loaded(SourceImage),
    Failed,
}

impl ImageLoad {
    pub fn image(&self) -> Option<SourceImage> {
        match self {
            ImageLoad::Loaded(image) if image.width > 0 && image.height > 0 => Some(*image),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub target_bounds: Rect,
    pub piece_width: f32,
    pub piece_height: f32,
}

impl GridLayout {
    pub fn total(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn correct_position(&self, row: u32, col: u32) -> (f32, f32) {
        (
            self.target_bounds.x + col as f32 * self.piece_width,
            self.target_bounds.y + row as f32 * self.piece_height,
        )
    }
}

/// Square solved-image zone: 60% of the short canvas side, kept within 90% of
/// the width and 80% of the height, centered below the header.
pub fn compute_target_bounds(viewport: Viewport) -> Rect {
    let mut target_w = viewport.width.min(viewport.height) * TARGET_SIZE_RATIO;
    let mut target_h = target_w;
    let max_w = viewport.width * TARGET_MAX_WIDTH_RATIO;
    let max_h = viewport.height * TARGET_MAX_HEIGHT_RATIO;
    if target_w > max_w {
        target_w = max_w;
        target_h = target_w;
    }
    if target_h > max_h {
        target_h = max_h;
        target_w = target_h;
    }
    let available_h = viewport.height - viewport.header_height;
    let x = (viewport.width - target_w) * 0.5;
    let y = viewport.header_height + (available_h - target_h) * 0.5;
    Rect::new(x, y, target_w, target_h)
}

pub fn compute_grid_layout(viewport: Viewport, rows: u32, cols: u32) -> GridLayout {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let target_bounds = compute_target_bounds(viewport);
    GridLayout {
        rows,
        cols,
        target_bounds,
        piece_width: target_bounds.w / cols as f32,
        piece_height: target_bounds.h / rows as f32,
    }
}

/// Largest centered region of the source matching the target aspect. Without
/// an image the placeholder square at the origin is used.
pub fn compute_source_crop(image: Option<SourceImage>, target: &Rect) -> Rect {
    let Some(image) = image else {
        return Rect::new(0.0, 0.0, PLACEHOLDER_IMAGE_SIZE, PLACEHOLDER_IMAGE_SIZE);
    };
    let img_w = image.width as f32;
    let img_h = image.height as f32;
    let img_ratio = img_w / img_h;
    let target_ratio = target.aspect();
    if img_ratio > target_ratio {
        let crop_h = img_h;
        let crop_w = crop_h * target_ratio;
        Rect::new((img_w - crop_w) * 0.5, 0.0, crop_w, crop_h)
    } else {
        let crop_w = img_w;
        let crop_h = crop_w / target_ratio;
        Rect::new(0.0, (img_h - crop_h) * 0.5, crop_w, crop_h)
    }
}

pub fn is_border_piece(row: u32, col: u32, rows: u32, cols: u32) -> bool {
    row == 0 || row + 1 == rows || col == 0 || col + 1 == cols
}

pub fn grid_label(rows: u32, cols: u32) -> String {
    format!("{}x{} ({} pieces)", rows, cols, rows * cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn target_bounds_use_short_side() {
        let bounds = compute_target_bounds(Viewport::new(1000.0, 800.0, 110.0));
        assert_relative_eq!(bounds.w, 480.0);
        assert_relative_eq!(bounds.h, 480.0);
        assert_relative_eq!(bounds.x, 260.0);
        assert_relative_eq!(bounds.y, 110.0 + (690.0 - 480.0) * 0.5);
    }

    #[test]
    fn target_bounds_respect_height_cap() {
        // 60% of 500 = 300 exceeds 80% of 350 = 280.
        let bounds = compute_target_bounds(Viewport::new(500.0, 350.0, 0.0));
        assert_relative_eq!(bounds.w, 280.0);
        assert_relative_eq!(bounds.h, 280.0);
    }

    #[test]
    fn piece_size_divides_bounds() {
        let layout = compute_grid_layout(Viewport::new(1000.0, 800.0, 110.0), 4, 6);
        assert_relative_eq!(layout.piece_width, 80.0);
        assert_relative_eq!(layout.piece_height, 120.0);
        let (x, y) = layout.correct_position(2, 3);
        assert_relative_eq!(x, layout.target_bounds.x + 240.0);
        assert_relative_eq!(y, layout.target_bounds.y + 240.0);
    }

    #[test]
    fn crop_trims_wide_images_horizontally() {
        let target = Rect::new(0.0, 0.0, 300.0, 300.0);
        let crop = compute_source_crop(
            Some(SourceImage {
                width: 400,
                height: 200,
            }),
            &target,
        );
        assert_eq!(crop, Rect::new(100.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn crop_trims_tall_images_vertically() {
        let target = Rect::new(0.0, 0.0, 300.0, 300.0);
        let crop = compute_source_crop(
            Some(SourceImage {
                width: 200,
                height: 500,
            }),
            &target,
        );
        assert_eq!(crop, Rect::new(0.0, 150.0, 200.0, 200.0));
    }

    #[test]
    fn crop_without_image_is_placeholder() {
        let target = Rect::new(10.0, 10.0, 300.0, 300.0);
        let crop = compute_source_crop(ImageLoad::Failed.image(), &target);
        assert_eq!(crop, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn grid_label_counts_pieces() {
        assert_eq!(grid_label(6, 6), "6x6 (36 pieces)");
    }
}
