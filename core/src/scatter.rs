use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{GridLayout, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScatterBand {
    Left,
    Right,
    Above,
    Below,
}

/// How a scatter position was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScatterOrigin {
    Band(ScatterBand),
    /// The chosen band was empty for this viewport.
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScatterPosition {
    pub x: f32,
    pub y: f32,
    pub origin: ScatterOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    min: f32,
    max: f32,
}

impl Span {
    fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn is_degenerate(&self) -> bool {
        !(self.min <= self.max)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

/// Picks a start position in one of the four bands around the target zone.
///
/// One coin decides between the side bands (left/right of the target, full
/// height below the header) and the top/bottom bands (full width, above or
/// below the target); a second coin picks the side. When the picked band has
/// no room the piece lands anywhere below the header.
pub fn scatter_position<R: Rng + ?Sized>(
    rng: &mut R,
    viewport: Viewport,
    layout: &GridLayout,
    margin: f32,
) -> ScatterPosition {
    let bounds = layout.target_bounds;
    let piece_w = layout.piece_width;
    let piece_h = layout.piece_height;
    let header = viewport.header_height;

    let (band, x_span, y_span) = if rng.random_bool(0.5) {
        let (band, x_span) = if rng.random_bool(0.5) {
            (ScatterBand::Left, Span::new(margin, bounds.x - piece_w - margin))
        } else {
            (
                ScatterBand::Right,
                Span::new(
                    bounds.right() + margin,
                    viewport.width - piece_w - margin,
                ),
            )
        };
        let y_span = Span::new(header + margin, viewport.height - piece_h - margin);
        (band, x_span, y_span)
    } else {
        let x_span = Span::new(margin, viewport.width - piece_w - margin);
        let (band, y_span) = if rng.random_bool(0.5) {
            (
                ScatterBand::Above,
                Span::new(header + margin, bounds.y - piece_h - margin),
            )
        } else {
            (
                ScatterBand::Below,
                Span::new(
                    bounds.bottom() + margin,
                    viewport.height - piece_h - margin,
                ),
            )
        };
        (band, x_span, y_span)
    };

    if x_span.is_degenerate() || y_span.is_degenerate() {
        log::debug!("scatter band {band:?} is empty, using fallback placement");
        return fallback_position(rng, viewport, piece_w, piece_h);
    }

    ScatterPosition {
        x: x_span.sample(rng),
        y: y_span.sample(rng),
        origin: ScatterOrigin::Band(band),
    }
}

fn fallback_position<R: Rng + ?Sized>(
    rng: &mut R,
    viewport: Viewport,
    piece_w: f32,
    piece_h: f32,
) -> ScatterPosition {
    let header = viewport.header_height;
    let x = rng.random::<f32>() * (viewport.width - piece_w);
    let y = header + rng.random::<f32>() * (viewport.height - piece_h - header);
    ScatterPosition {
        x,
        y,
        origin: ScatterOrigin::Fallback,
    }
}
