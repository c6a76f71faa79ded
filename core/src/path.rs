use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::catalog::BoundaryKind;
use crate::edges::EdgeSigns;
use crate::grid::Rect;

/// Edge length is split into this many units for the tab profile.
pub const TAB_UNITS: f32 = 10.0;
/// Depth units are measured against the shorter piece side and scaled down so
/// two indented neighbors around a corner never meet.
pub const TAB_DEPTH_RATIO: f32 = 0.9;
pub const TAB_SHOULDER_DEPTH: f32 = 2.5;
pub const TAB_HEAD_DEPTH: f32 = 4.5;
pub const CURVE_FLATTEN_STEPS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    LineTo {
        x: f32,
        y: f32,
    },
    CubicTo {
        c1: (f32, f32),
        c2: (f32, f32),
        to: (f32, f32),
    },
}

impl Segment {
    pub fn end(&self) -> (f32, f32) {
        match *self {
            Segment::LineTo { x, y } => (x, y),
            Segment::CubicTo { to, .. } => to,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeOrientation {
    /// Left to right along y = 0, outward is -y.
    Top,
    /// Top to bottom along x = width, outward is +x.
    Right,
    /// Right to left along y = height, outward is +y.
    Bottom,
    /// Bottom to top along x = 0, outward is -x.
    Left,
}

impl EdgeOrientation {
    fn map(self, origin: (f32, f32), along: f32, out: f32) -> (f32, f32) {
        let (ox, oy) = origin;
        match self {
            EdgeOrientation::Top => (ox + along, oy - out),
            EdgeOrientation::Right => (ox + out, oy + along),
            EdgeOrientation::Bottom => (ox - along, oy + out),
            EdgeOrientation::Left => (ox - out, oy - along),
        }
    }
}

/// Closed outline in piece-local coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PiecePath {
    pub start: (f32, f32),
    pub segments: Vec<Segment>,
}

impl PiecePath {
    pub fn rect(width: f32, height: f32) -> Self {
        Self {
            start: (0.0, 0.0),
            segments: vec![
                Segment::LineTo { x: width, y: 0.0 },
                Segment::LineTo {
                    x: width,
                    y: height,
                },
                Segment::LineTo { x: 0.0, y: height },
                Segment::LineTo { x: 0.0, y: 0.0 },
            ],
        }
    }

    pub fn end(&self) -> (f32, f32) {
        self.segments
            .last()
            .map(Segment::end)
            .unwrap_or(self.start)
    }

    pub fn is_closed(&self) -> bool {
        let (sx, sy) = self.start;
        let (ex, ey) = self.end();
        (sx - ex).abs() <= 1e-3 && (sy - ey).abs() <= 1e-3
    }

    /// SVG path data, closed with `Z`.
    pub fn svg_data(&self) -> String {
        let mut data = String::new();
        let _ = write!(data, "M {} {}", fmt_f32(self.start.0), fmt_f32(self.start.1));
        for segment in &self.segments {
            match *segment {
                Segment::LineTo { x, y } => {
                    let _ = write!(data, " L {} {}", fmt_f32(x), fmt_f32(y));
                }
                Segment::CubicTo { c1, c2, to } => {
                    let _ = write!(
                        data,
                        " C {} {} {} {} {} {}",
                        fmt_f32(c1.0),
                        fmt_f32(c1.1),
                        fmt_f32(c2.0),
                        fmt_f32(c2.1),
                        fmt_f32(to.0),
                        fmt_f32(to.1)
                    );
                }
            }
        }
        data.push_str(" Z");
        data
    }

    /// Polyline approximation; curves are sampled with `steps` chords each.
    pub fn flatten(&self, steps: usize) -> Vec<(f32, f32)> {
        let steps = steps.max(1);
        let mut points = Vec::with_capacity(self.segments.len() * steps + 1);
        let mut current = self.start;
        points.push(current);
        for segment in &self.segments {
            match *segment {
                Segment::LineTo { x, y } => {
                    points.push((x, y));
                    current = (x, y);
                }
                Segment::CubicTo { c1, c2, to } => {
                    for step in 1..=steps {
                        let t = step as f32 / steps as f32;
                        points.push(cubic_point(current, c1, c2, to, t));
                    }
                    current = to;
                }
            }
        }
        points
    }

    pub fn bounds(&self) -> Rect {
        let points = self.flatten(CURVE_FLATTEN_STEPS);
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Shape carried by each piece; selects outline and clip behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PieceShape {
    Rect { width: f32, height: f32 },
    Jigsaw(PiecePath),
}

impl PieceShape {
    pub fn build(kind: BoundaryKind, width: f32, height: f32, signs: EdgeSigns) -> Self {
        match kind {
            BoundaryKind::Grid => PieceShape::Rect { width, height },
            BoundaryKind::Jigsaw => PieceShape::Jigsaw(build_piece_path(width, height, signs)),
        }
    }

    pub fn kind(&self) -> BoundaryKind {
        match self {
            PieceShape::Rect { .. } => BoundaryKind::Grid,
            PieceShape::Jigsaw(_) => BoundaryKind::Jigsaw,
        }
    }

    pub fn outline(&self) -> PiecePath {
        match self {
            PieceShape::Rect { width, height } => PiecePath::rect(*width, *height),
            PieceShape::Jigsaw(path) => path.clone(),
        }
    }
}

pub fn cubic_point(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let u = 1.0 - t;
    let tt = t * t;
    let uu = u * u;
    let uuu = uu * u;
    let ttt = tt * t;
    (
        uuu * p0.0 + 3.0 * uu * t * p1.0 + 3.0 * u * tt * p2.0 + ttt * p3.0,
        uuu * p0.1 + 3.0 * uu * t * p1.1 + 3.0 * u * tt * p2.1 + ttt * p3.1,
    )
}

/// Appends one internal edge starting at `origin`: a straight shoulder, two
/// cubics forming the lobe, and a straight run to the end of the edge.
pub fn append_tab(
    segments: &mut Vec<Segment>,
    orientation: EdgeOrientation,
    origin: (f32, f32),
    len: f32,
    depth_unit: f32,
    sign: i8,
) {
    let v = len / TAB_UNITS;
    let d = depth_unit * sign as f32;
    let at = |along: f32, out: f32| orientation.map(origin, along, out);

    let (x, y) = at(v * 3.0, 0.0);
    segments.push(Segment::LineTo { x, y });
    segments.push(Segment::CubicTo {
        c1: at(v * 2.0, d * TAB_SHOULDER_DEPTH),
        c2: at(v * 4.0, d * TAB_HEAD_DEPTH),
        to: at(v * 5.0, d * TAB_HEAD_DEPTH),
    });
    segments.push(Segment::CubicTo {
        c1: at(v * 6.0, d * TAB_HEAD_DEPTH),
        c2: at(v * 8.0, d * TAB_SHOULDER_DEPTH),
        to: at(v * 7.0, 0.0),
    });
    let (x, y) = at(len, 0.0);
    segments.push(Segment::LineTo { x, y });
}

fn append_edge(
    segments: &mut Vec<Segment>,
    orientation: EdgeOrientation,
    origin: (f32, f32),
    len: f32,
    depth_unit: f32,
    sign: i8,
) {
    if sign == 0 {
        let (x, y) = orientation.map(origin, len, 0.0);
        segments.push(Segment::LineTo { x, y });
    } else {
        append_tab(segments, orientation, origin, len, depth_unit, sign);
    }
}

/// Walks top, right, bottom, left starting at the top-left corner.
pub fn build_piece_path(width: f32, height: f32, signs: EdgeSigns) -> PiecePath {
    let depth_unit = width.min(height) / TAB_UNITS * TAB_DEPTH_RATIO;
    let mut segments = Vec::with_capacity(16);
    append_edge(
        &mut segments,
        EdgeOrientation::Top,
        (0.0, 0.0),
        width,
        depth_unit,
        signs.top,
    );
    append_edge(
        &mut segments,
        EdgeOrientation::Right,
        (width, 0.0),
        height,
        depth_unit,
        signs.right,
    );
    append_edge(
        &mut segments,
        EdgeOrientation::Bottom,
        (width, height),
        width,
        depth_unit,
        signs.bottom,
    );
    append_edge(
        &mut segments,
        EdgeOrientation::Left,
        (0.0, height),
        height,
        depth_unit,
        signs.left,
    );
    PiecePath {
        start: (0.0, 0.0),
        segments,
    }
}

/// Farthest a tab can reach outside the piece rectangle.
pub fn tab_overhang(width: f32, height: f32) -> f32 {
    width.min(height) / TAB_UNITS * TAB_DEPTH_RATIO * TAB_HEAD_DEPTH
}

pub fn fmt_f32(value: f32) -> String {
    format!("{:.3}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn orientation(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }

    fn crosses(a: (f32, f32), b: (f32, f32), c: (f32, f32), d: (f32, f32)) -> bool {
        let eps = 1e-4;
        let o1 = orientation(a, b, c);
        let o2 = orientation(a, b, d);
        let o3 = orientation(c, d, a);
        let o4 = orientation(c, d, b);
        ((o1 > eps && o2 < -eps) || (o1 < -eps && o2 > eps))
            && ((o3 > eps && o4 < -eps) || (o3 < -eps && o4 > eps))
    }

    fn has_self_intersection(points: &[(f32, f32)]) -> bool {
        let n = points.len() - 1;
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if crosses(points[i], points[i + 1], points[j], points[j + 1]) {
                    return true;
                }
            }
        }
        false
    }

    fn all_sign_combinations() -> Vec<EdgeSigns> {
        let options = [-1i8, 0, 1];
        let mut out = Vec::new();
        for top in options {
            for right in options {
                for bottom in options {
                    for left in options {
                        out.push(EdgeSigns {
                            top,
                            right,
                            bottom,
                            left,
                        });
                    }
                }
            }
        }
        out
    }

    #[test]
    fn flat_piece_is_a_rectangle() {
        let path = build_piece_path(80.0, 60.0, EdgeSigns::FLAT);
        assert_eq!(path, PiecePath::rect(80.0, 60.0));
        assert_eq!(
            path.svg_data(),
            "M 0.000 0.000 L 80.000 0.000 L 80.000 60.000 L 0.000 60.000 L 0.000 0.000 Z"
        );
    }

    #[test]
    fn every_sign_combination_closes_without_crossing() {
        for (width, height) in [(80.0, 80.0), (120.0, 60.0), (50.0, 100.0)] {
            for signs in all_sign_combinations() {
                let path = build_piece_path(width, height, signs);
                assert!(path.is_closed(), "{signs:?} not closed");
                let points = path.flatten(CURVE_FLATTEN_STEPS);
                assert!(
                    !has_self_intersection(&points),
                    "{signs:?} self-intersects at {width}x{height}"
                );
            }
        }
    }

    #[test]
    fn tab_protrudes_and_blank_indents() {
        let tab = build_piece_path(
            100.0,
            100.0,
            EdgeSigns {
                top: 1,
                ..EdgeSigns::FLAT
            },
        );
        let bounds = tab.bounds();
        assert!(bounds.y < -30.0);
        assert_relative_eq!(bounds.y, -tab_overhang(100.0, 100.0), epsilon = 1e-3);

        let blank = build_piece_path(
            100.0,
            100.0,
            EdgeSigns {
                top: -1,
                ..EdgeSigns::FLAT
            },
        );
        assert_relative_eq!(blank.bounds().y, 0.0);
        let lowest_on_top = blank
            .flatten(CURVE_FLATTEN_STEPS)
            .into_iter()
            .filter(|(x, _)| *x > 40.0 && *x < 60.0)
            .map(|(_, y)| y)
            .fold(0.0f32, f32::max);
        assert!(lowest_on_top > 30.0);
    }

    #[test]
    fn neighbor_edges_coincide() {
        // Right edge of a tab piece against the left edge of its blank neighbor.
        let (w, h) = (90.0, 70.0);
        let left_piece = build_piece_path(
            w,
            h,
            EdgeSigns {
                right: 1,
                ..EdgeSigns::FLAT
            },
        );
        let right_piece = build_piece_path(
            w,
            h,
            EdgeSigns {
                left: -1,
                ..EdgeSigns::FLAT
            },
        );
        let on_shared_edge = |points: Vec<(f32, f32)>, offset: f32| -> Vec<(f32, f32)> {
            points
                .into_iter()
                .map(|(x, y)| (x + offset, y))
                .filter(|(x, _)| *x > w - 40.0 && *x < w + 40.0)
                .collect()
        };
        let covered = |from: &[(f32, f32)], into: &[(f32, f32)]| {
            from.iter().all(|a| {
                into.iter()
                    .any(|b| (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3)
            })
        };
        let a = on_shared_edge(left_piece.flatten(CURVE_FLATTEN_STEPS), 0.0);
        let b = on_shared_edge(right_piece.flatten(CURVE_FLATTEN_STEPS), w);
        assert!(a.len() > 8);
        assert!(covered(&a, &b));
        assert!(covered(&b, &a));
    }

    #[test]
    fn shape_variants_supply_outline() {
        let rect = PieceShape::build(BoundaryKind::Grid, 40.0, 30.0, EdgeSigns::FLAT);
        assert_eq!(rect.kind(), BoundaryKind::Grid);
        assert_eq!(rect.outline(), PiecePath::rect(40.0, 30.0));

        let signs = EdgeSigns {
            top: 0,
            right: 1,
            bottom: -1,
            left: 0,
        };
        let jigsaw = PieceShape::build(BoundaryKind::Jigsaw, 40.0, 30.0, signs);
        assert_eq!(jigsaw.kind(), BoundaryKind::Jigsaw);
        assert_eq!(jigsaw.outline().segments.len(), 1 + 4 + 4 + 1);
    }
}
