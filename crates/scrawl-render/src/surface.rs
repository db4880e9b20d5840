//! Pixmap plumbing shared by the renderers

use scrawl_core::types::{BitmapData, InkBlend, PaperKind};
use scrawl_core::Color;
use tiny_skia::{BlendMode, FilterQuality, IntSize, Paint, Pixmap, PixmapPaint, Rect, Transform};

/// Flat paper tone used when no texture is available
const PAPER_TONE: Color = Color::rgb(251, 248, 240);
/// Rule color for synthesized lined paper
const RULE_TONE: Color = Color::rgba(168, 192, 220, 200);
/// Synthesized rules never sit closer than this many pixels
pub(crate) const MIN_RULE_SPACING: f32 = 26.0;
/// Rule spacing as a fraction of surface height
pub(crate) const RULE_SPACING_FRACTION: f32 = 0.06;

pub(crate) fn to_skia_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub(crate) fn blend_mode(blend: InkBlend) -> BlendMode {
    match blend {
        InkBlend::Multiply => BlendMode::Multiply,
        InkBlend::Darken => BlendMode::Darken,
        InkBlend::Overlay => BlendMode::Overlay,
        InkBlend::SourceOver => BlendMode::SourceOver,
    }
}

/// Wrap straight-alpha RGBA pixels into a premultiplied pixmap.
pub(crate) fn image_to_pixmap(img: &image::RgbaImage) -> Option<Pixmap> {
    let (w, h) = img.dimensions();
    let size = IntSize::from_wh(w, h)?;
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a < 255 {
            px[0] = (px[0] as u32 * a / 255) as u8;
            px[1] = (px[1] as u32 * a / 255) as u8;
            px[2] = (px[2] as u32 * a / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

/// Convert a finished pixmap back to straight-alpha RGBA.
pub(crate) fn pixmap_to_bitmap(pixmap: Pixmap) -> BitmapData {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut data = pixmap.take();
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a < 255 {
            let a = a as u32;
            px[0] = ((px[0] as u32 * 255 + a / 2) / a).min(255) as u8;
            px[1] = ((px[1] as u32 * 255 + a / 2) / a).min(255) as u8;
            px[2] = ((px[2] as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
    BitmapData::new(width, height, data)
}

/// Draw `img` scaled to cover the whole surface, cropping overflow on the
/// larger axis.
pub(crate) fn draw_cover(surface: &mut Pixmap, img: &image::RgbaImage) -> bool {
    let Some(texture) = image_to_pixmap(img) else {
        return false;
    };
    let (tw, th) = (texture.width() as f32, texture.height() as f32);
    let (sw, sh) = (surface.width() as f32, surface.height() as f32);
    let scale = (sw / tw).max(sh / th);
    // Center the cropped axis
    let tx = (sw - tw * scale) * 0.5;
    let ty = (sh - th * scale) * 0.5;

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_scale(scale, scale).post_translate(tx, ty);
    surface.draw_pixmap(0, 0, texture.as_ref(), &paint, transform, None);
    true
}

/// Flat paper fill, plus synthesized rules for lined templates that have
/// no usable texture.
pub(crate) fn synthesize_paper(surface: &mut Pixmap, kind: PaperKind) {
    surface.fill(to_skia_color(PAPER_TONE));
    if kind == PaperKind::Lined {
        let height = surface.height() as f32;
        let spacing = (height * RULE_SPACING_FRACTION).max(MIN_RULE_SPACING);
        draw_rules(surface, spacing, spacing, RULE_TONE);
    }
}

/// Horizontal rules from `first_y` down, one every `spacing` pixels.
pub(crate) fn draw_rules(surface: &mut Pixmap, first_y: f32, spacing: f32, color: Color) {
    if spacing <= 0.0 {
        return;
    }
    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));

    let mut y = first_y;
    while y < height {
        if let Some(rect) = Rect::from_xywh(0.0, y, width, 1.0) {
            surface.fill_rect(rect, &paint, Transform::identity(), None);
        }
        y += spacing;
    }
}

/// Low-alpha analog grain: a darken, an overlay, and a lighten pass over
/// the whole surface. Level 1 is heaviest, 5 nearly clean.
pub(crate) fn grain_passes(surface: &mut Pixmap, realism: u8) {
    let level = realism.clamp(1, 5) as f32;
    let alpha = (0.0575 - 0.0075 * level).clamp(0.02, 0.05);

    let full = match Rect::from_xywh(0.0, 0.0, surface.width() as f32, surface.height() as f32) {
        Some(rect) => rect,
        None => return,
    };

    let mut pass = |r: u8, g: u8, b: u8, a: f32, mode: BlendMode| {
        let mut paint = Paint::default();
        let mut color = tiny_skia::Color::from_rgba8(r, g, b, 255);
        color.set_alpha(a);
        paint.set_color(color);
        paint.blend_mode = mode;
        surface.fill_rect(full, &paint, Transform::identity(), None);
    };

    pass(70, 62, 52, alpha, BlendMode::Darken);
    pass(128, 128, 128, alpha, BlendMode::Overlay);
    pass(236, 233, 222, alpha * 0.6, BlendMode::Lighten);
}
