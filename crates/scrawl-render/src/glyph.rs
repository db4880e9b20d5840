//! One character onto the surface: outline fill, or a fallback mark

use kurbo::Shape;
use scrawl_core::types::TextVariation;
use scrawl_core::FontFace;
use skrifa::MetadataProvider;
use tiny_skia::{BlendMode, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::surface::to_skia_color;

/// Bridge from skrifa's outline callbacks into a kurbo path
struct OutlineCollector<'a> {
    path: &'a mut kurbo::BezPath,
}

impl skrifa::outline::OutlinePen for OutlineCollector<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path
            .quad_to((cx0 as f64, cy0 as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

/// Extract a glyph outline at `size`, already in pixel units with y-up
/// orientation. `None` covers missing glyphs, unparsable font data, and
/// degenerate outlines alike.
pub(crate) fn outline_path(face: &dyn FontFace, glyph_id: u32, size: f32) -> Option<tiny_skia::Path> {
    let font = skrifa::FontRef::new(face.data()).ok()?;
    let glyph = font.outline_glyphs().get(skrifa::GlyphId::new(glyph_id))?;

    let mut path = kurbo::BezPath::new();
    let settings = skrifa::outline::DrawSettings::unhinted(
        skrifa::instance::Size::new(size),
        skrifa::instance::LocationRef::default(),
    );
    glyph
        .draw(settings, &mut OutlineCollector { path: &mut path })
        .ok()?;

    let bbox = path.bounding_box();
    if !bbox.x0.is_finite() || !bbox.y1.is_finite() || bbox.width() == 0.0 || bbox.height() == 0.0 {
        return None;
    }

    let mut builder = PathBuilder::new();
    for element in path.elements() {
        match *element {
            kurbo::PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            kurbo::PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            kurbo::PathEl::QuadTo(c, p) => {
                builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
            },
            kurbo::PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            kurbo::PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Draw one character at the pen position with its variation applied.
///
/// The glyph is translated to the jittered baseline and rotated around
/// the pen point by slant plus micro-tilt. When no outline is usable a
/// small filled mark stands in, so rendered text is never invisible.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_char(
    surface: &mut Pixmap,
    face: &dyn FontFace,
    ch: char,
    pen_x: f32,
    baseline_y: f32,
    size: f32,
    variation: &TextVariation,
    blend: BlendMode,
    antialias: bool,
) {
    let y = baseline_y + variation.baseline_jitter;
    let angle_deg = (variation.slant_jitter + variation.micro_tilt).to_degrees();

    let mut paint = Paint::default();
    paint.set_color(to_skia_color(variation.color));
    paint.anti_alias = antialias;
    paint.blend_mode = blend;

    let path = face.glyph_id(ch).and_then(|gid| outline_path(face, gid, size));
    match path {
        Some(path) => {
            // Outline coordinates are y-up around the pen origin
            let place = Transform::from_scale(1.0, -1.0).post_translate(pen_x, y);
            let transform = place.post_concat(Transform::from_rotate_at(angle_deg, pen_x, y));
            surface.fill_path(&path, &paint, FillRule::Winding, transform, None);
        },
        None => {
            log::trace!("no outline for {ch:?}, drawing fallback mark");
            let w = size * 0.45;
            let h = size * 0.55;
            if let Some(rect) = Rect::from_xywh(pen_x, y - h, w.max(1.0), h.max(1.0)) {
                let transform = Transform::from_rotate_at(angle_deg, pen_x, y);
                surface.fill_rect(rect, &paint, transform, None);
            }
        },
    }
}
