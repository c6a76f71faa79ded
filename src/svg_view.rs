use std::fmt::Write as _;

use puzzlegift_core::path::fmt_f32;
use puzzlegift_core::{Rect, SourceImage};

use crate::app_core::AppSnapshot;
use crate::renderer::{
    build_render_plan, DrawCommand, PieceClip, PieceDraw, PieceFill, RenderPlan,
    PLACEHOLDER_LABEL_OFFSET,
};
use crate::runtime::{GameView, ViewHooks};

const BACKGROUND: &str = "#1b1f2a";

/// Headless view that keeps the latest frame as a standalone SVG document.
#[derive(Default)]
pub struct SvgView {
    hooks: Option<ViewHooks>,
    document: Option<String>,
    frames: u64,
}

impl SvgView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn hooks(&self) -> Option<&ViewHooks> {
        self.hooks.as_ref()
    }
}

impl GameView for SvgView {
    fn init(&mut self, hooks: ViewHooks) {
        self.hooks = Some(hooks);
    }

    fn render(&mut self, snapshot: &AppSnapshot) {
        let plan = build_render_plan(snapshot);
        self.document = Some(render_svg(&plan, snapshot.image_href.as_deref()));
        self.frames += 1;
    }

    fn shutdown(&mut self) {
        self.hooks = None;
    }
}

pub fn render_snapshot_svg(snapshot: &AppSnapshot) -> String {
    render_svg(&build_render_plan(snapshot), snapshot.image_href.as_deref())
}

/// Serializes a render plan. Image fills are skipped when no `href` is
/// available; outlines are still drawn.
pub fn render_svg(plan: &RenderPlan, image_href: Option<&str>) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt_f32(plan.width),
        h = fmt_f32(plan.height),
    );
    write_defs(&mut out, plan);
    let _ = write!(
        out,
        r#"<rect width="100%" height="100%" fill="{BACKGROUND}"/>"#
    );
    for command in &plan.commands {
        match command {
            DrawCommand::TargetOutline {
                bounds,
                color,
                width,
                dash,
            } => {
                let _ = write!(
                    out,
                    r#"<rect class="target" x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}" stroke-dasharray="{} {}"/>"#,
                    fmt_f32(bounds.x),
                    fmt_f32(bounds.y),
                    fmt_f32(bounds.w),
                    fmt_f32(bounds.h),
                    color,
                    fmt_f32(*width),
                    fmt_f32(dash[0]),
                    fmt_f32(dash[1]),
                );
            }
            DrawCommand::Hint {
                bounds,
                crop,
                source,
                alpha,
            } => {
                if let Some(href) = image_href {
                    let _ = write!(out, r#"<g class="hint" opacity="{}">"#, fmt_f32(*alpha));
                    write_cropped_image(&mut out, href, *bounds, *crop, *source);
                    out.push_str("</g>");
                }
            }
            DrawCommand::Particle { x, y, size, color } => {
                let _ = write!(
                    out,
                    r#"<rect class="particle" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    fmt_f32(*x),
                    fmt_f32(*y),
                    fmt_f32(*size),
                    fmt_f32(*size),
                    color,
                );
            }
            DrawCommand::Piece(piece) => write_piece(&mut out, piece, image_href),
        }
    }
    out.push_str("</svg>");
    out
}

fn write_defs(out: &mut String, plan: &RenderPlan) {
    out.push_str("<defs>");
    for piece in plan.pieces() {
        let _ = write!(out, r#"<clipPath id="{}">"#, clip_id(piece.index));
        write_clip_shape(out, &piece.clip, "");
        out.push_str("</clipPath>");
    }
    out.push_str("</defs>");
}

fn clip_id(index: usize) -> String {
    format!("piece-clip-{index}")
}

fn write_clip_shape(out: &mut String, clip: &PieceClip, attrs: &str) {
    match clip {
        PieceClip::Rect { width, height } => {
            let _ = write!(
                out,
                r#"<rect width="{}" height="{}"{attrs}/>"#,
                fmt_f32(*width),
                fmt_f32(*height),
            );
        }
        PieceClip::Path(data) => {
            let _ = write!(out, r#"<path d="{data}"{attrs}/>"#);
        }
    }
}

fn write_piece(out: &mut String, piece: &PieceDraw, image_href: Option<&str>) {
    let _ = write!(
        out,
        r#"<g class="piece" data-row="{}" data-col="{}" transform="translate({} {})">"#,
        piece.row,
        piece.col,
        fmt_f32(piece.x),
        fmt_f32(piece.y),
    );
    let _ = write!(out, r#"<g clip-path="url(#{})">"#, clip_id(piece.index));
    match &piece.fill {
        PieceFill::Image {
            dx,
            dy,
            width,
            height,
            crop,
            source,
        } => {
            if let Some(href) = image_href {
                let dest = Rect::new(*dx, *dy, *width, *height);
                write_cropped_image(out, href, dest, *crop, *source);
            }
        }
        PieceFill::Placeholder { color, label } => {
            write_clip_shape(out, &piece.clip, &format!(r#" fill="{color}""#));
            let _ = write!(
                out,
                r##"<text x="{}" y="{}" fill="#fff" font-family="sans-serif" font-size="14">{}</text>"##,
                fmt_f32(PLACEHOLDER_LABEL_OFFSET.0),
                fmt_f32(PLACEHOLDER_LABEL_OFFSET.1),
                escape_xml(label),
            );
        }
    }
    out.push_str("</g>");
    write_clip_shape(
        out,
        &piece.clip,
        &format!(
            r#" fill="none" stroke="{}" stroke-width="{}""#,
            piece.stroke,
            fmt_f32(piece.stroke_width)
        ),
    );
    out.push_str("</g>");
}

/// Draws the `crop` region of the source image stretched over `dest`.
fn write_cropped_image(out: &mut String, href: &str, dest: Rect, crop: Rect, source: SourceImage) {
    let _ = write!(
        out,
        r#"<svg x="{}" y="{}" width="{}" height="{}" viewBox="{} {} {} {}" preserveAspectRatio="none">"#,
        fmt_f32(dest.x),
        fmt_f32(dest.y),
        fmt_f32(dest.w),
        fmt_f32(dest.h),
        fmt_f32(crop.x),
        fmt_f32(crop.y),
        fmt_f32(crop.w),
        fmt_f32(crop.h),
    );
    let _ = write!(
        out,
        r#"<image href="{}" width="{}" height="{}"/></svg>"#,
        escape_xml(href),
        source.width,
        source.height,
    );
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{FREE_STROKE, OUTLINE_WIDTH};

    fn placeholder_plan() -> RenderPlan {
        RenderPlan {
            width: 400.0,
            height: 300.0,
            commands: vec![
                DrawCommand::TargetOutline {
                    bounds: Rect::new(50.0, 120.0, 200.0, 100.0),
                    color: "rgba(255, 255, 255, 0.3)",
                    width: 2.0,
                    dash: [10.0, 5.0],
                },
                DrawCommand::Piece(PieceDraw {
                    index: 0,
                    row: 1,
                    col: 2,
                    x: 10.0,
                    y: 20.0,
                    clip: PieceClip::Rect {
                        width: 100.0,
                        height: 50.0,
                    },
                    fill: PieceFill::Placeholder {
                        color: "hsl(150, 70%, 50%)".to_string(),
                        label: "1,2".to_string(),
                    },
                    stroke: FREE_STROKE,
                    stroke_width: OUTLINE_WIDTH,
                }),
            ],
        }
    }

    #[test]
    fn placeholder_piece_is_clipped_and_labelled() {
        let svg = render_svg(&placeholder_plan(), None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<clipPath id="piece-clip-0">"#));
        assert!(svg.contains(r#"stroke-dasharray="10.000 5.000""#));
        assert!(svg.contains(r#"transform="translate(10.000 20.000)""#));
        assert!(svg.contains(">1,2</text>"));
        assert!(svg.contains(r#"fill="hsl(150, 70%, 50%)""#));
        assert!(svg.contains(r##"stroke="#fff""##));
    }

    #[test]
    fn image_fill_needs_an_href() {
        let mut plan = placeholder_plan();
        if let DrawCommand::Piece(piece) = &mut plan.commands[1] {
            piece.fill = PieceFill::Image {
                dx: -100.0,
                dy: 0.0,
                width: 200.0,
                height: 100.0,
                crop: Rect::new(0.0, 0.0, 640.0, 320.0),
                source: SourceImage {
                    width: 640,
                    height: 480,
                },
            };
        }
        let without = render_svg(&plan, None);
        assert!(!without.contains("<image"));
        let with = render_svg(&plan, Some("stage_1.png?a=1&b=2"));
        assert!(with.contains(r#"href="stage_1.png?a=1&amp;b=2""#));
        assert!(with.contains(r#"viewBox="0.000 0.000 640.000 320.000""#));
        assert!(with.contains(r#"width="640" height="480""#));
    }
}
