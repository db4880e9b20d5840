//! Rescaling, degrading, and filtering decoded textures

use crate::PaperTexture;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::sync::Arc;

/// Quality values below this trigger the lossy down/up resample
const DEGRADE_THRESHOLD: f32 = 0.7;

/// Resizes and filters textures under the active quality profile
pub struct TextureProcessor {
    max_texture_size: u32,
}

impl TextureProcessor {
    pub fn new(max_texture_size: u32) -> Self {
        Self {
            max_texture_size: max_texture_size.max(1),
        }
    }

    pub fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    /// Resize both layers to `width x height`, clamped so neither
    /// dimension exceeds the configured maximum (aspect ratio preserved
    /// by shrinking the larger dimension first).
    ///
    /// Requesting the current size is an identity no-op: the same `Arc`
    /// comes back untouched.
    pub fn scale(&self, texture: &Arc<PaperTexture>, width: u32, height: u32) -> Arc<PaperTexture> {
        let Some((cur_w, cur_h)) = texture.dimensions() else {
            return texture.clone();
        };
        let (width, height) = self.clamp_dimensions(width.max(1), height.max(1));
        if (cur_w, cur_h) == (width, height) {
            return texture.clone();
        }

        log::debug!(
            "scaling texture '{}' {cur_w}x{cur_h} -> {width}x{height}",
            texture.template_id
        );
        Arc::new(PaperTexture {
            template_id: texture.template_id.clone(),
            base: texture
                .base
                .as_ref()
                .map(|img| imageops::resize(img, width, height, FilterType::Triangle)),
            lines: texture
                .lines
                .as_ref()
                .map(|img| imageops::resize(img, width, height, FilterType::Triangle)),
            loaded: texture.loaded,
        })
    }

    /// Cheap quality degradation under memory pressure: for low quality
    /// values, downsample then upsample so the texture keeps its size but
    /// intentionally loses detail.
    pub fn adjust_quality(&self, texture: &Arc<PaperTexture>, quality: f32) -> Arc<PaperTexture> {
        let quality = if quality.is_finite() {
            quality.clamp(0.1, 1.0)
        } else {
            1.0
        };
        if quality >= DEGRADE_THRESHOLD {
            return texture.clone();
        }
        let Some((w, h)) = texture.dimensions() else {
            return texture.clone();
        };
        let small_w = ((w as f32 * quality) as u32).max(1);
        let small_h = ((h as f32 * quality) as u32).max(1);

        let degrade = |img: &RgbaImage| {
            let small = imageops::resize(img, small_w, small_h, FilterType::Triangle);
            imageops::resize(&small, w, h, FilterType::Nearest)
        };
        Arc::new(PaperTexture {
            template_id: texture.template_id.clone(),
            base: texture.base.as_ref().map(degrade),
            lines: texture.lines.as_ref().map(degrade),
            loaded: texture.loaded,
        })
    }

    /// Apply a filter string like `"blur(1.5) contrast(12) brightness(-10)"`
    /// during a redraw pass. Unknown filter names warn and are skipped.
    pub fn apply_filters(&self, texture: &Arc<PaperTexture>, spec: &str) -> Arc<PaperTexture> {
        let filters = parse_filters(spec);
        if filters.is_empty() {
            return texture.clone();
        }
        let apply = |img: &RgbaImage| {
            let mut out = img.clone();
            for filter in &filters {
                out = filter.apply(&out);
            }
            out
        };
        Arc::new(PaperTexture {
            template_id: texture.template_id.clone(),
            base: texture.base.as_ref().map(apply),
            lines: texture.lines.as_ref().map(apply),
            loaded: texture.loaded,
        })
    }

    fn clamp_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max = self.max_texture_size;
        let larger = width.max(height);
        if larger <= max {
            return (width, height);
        }
        let factor = max as f32 / larger as f32;
        (
            ((width as f32 * factor) as u32).max(1),
            ((height as f32 * factor) as u32).max(1),
        )
    }
}

impl Default for TextureProcessor {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[derive(Debug, PartialEq)]
enum Filter {
    Blur(f32),
    Sharpen(f32),
    Contrast(f32),
    Brightness(i32),
}

impl Filter {
    fn apply(&self, img: &RgbaImage) -> RgbaImage {
        match *self {
            Filter::Blur(sigma) => imageops::blur(img, sigma.max(0.0)),
            Filter::Sharpen(sigma) => imageops::unsharpen(img, sigma.max(0.0), 2),
            Filter::Contrast(c) => imageops::contrast(img, c),
            Filter::Brightness(b) => imageops::brighten(img, b),
        }
    }
}

fn parse_filters(spec: &str) -> Vec<Filter> {
    spec.split_whitespace()
        .filter_map(|token| {
            let (name, rest) = token.split_once('(')?;
            let arg = rest.strip_suffix(')')?;
            let value: f32 = arg.parse().ok()?;
            match name {
                "blur" => Some(Filter::Blur(value)),
                "sharpen" => Some(Filter::Sharpen(value)),
                "contrast" => Some(Filter::Contrast(value)),
                "brightness" => Some(Filter::Brightness(value as i32)),
                other => {
                    log::warn!("ignoring unknown texture filter '{other}'");
                    None
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(w: u32, h: u32) -> Arc<PaperTexture> {
        Arc::new(PaperTexture {
            template_id: "t".to_string(),
            base: Some(RgbaImage::from_pixel(w, h, image::Rgba([230, 225, 210, 255]))),
            lines: None,
            loaded: true,
        })
    }

    #[test]
    fn same_size_scale_is_identity() {
        let processor = TextureProcessor::default();
        let tex = texture(64, 48);
        let scaled = processor.scale(&tex, 64, 48);
        assert!(Arc::ptr_eq(&tex, &scaled));
    }

    #[test]
    fn scale_resizes_both_dimensions() {
        let processor = TextureProcessor::default();
        let tex = texture(64, 48);
        let scaled = processor.scale(&tex, 32, 24);
        assert_eq!(scaled.dimensions(), Some((32, 24)));
    }

    #[test]
    fn scale_clamps_to_max_texture_size() {
        let processor = TextureProcessor::new(100);
        let tex = texture(64, 48);
        let scaled = processor.scale(&tex, 400, 200);
        let (w, h) = scaled.dimensions().unwrap();
        assert!(w <= 100 && h <= 100);
        // Aspect ratio roughly preserved
        assert_eq!((w, h), (100, 50));
    }

    #[test]
    fn high_quality_adjustment_is_a_no_op() {
        let processor = TextureProcessor::default();
        let tex = texture(32, 32);
        let adjusted = processor.adjust_quality(&tex, 0.9);
        assert!(Arc::ptr_eq(&tex, &adjusted));
    }

    #[test]
    fn low_quality_keeps_dimensions_but_rebuilds_pixels() {
        let processor = TextureProcessor::default();
        let tex = texture(32, 32);
        let adjusted = processor.adjust_quality(&tex, 0.25);
        assert!(!Arc::ptr_eq(&tex, &adjusted));
        assert_eq!(adjusted.dimensions(), Some((32, 32)));
    }

    #[test]
    fn filter_parsing_skips_unknown_names() {
        let filters = parse_filters("blur(1.5) vignette(3) contrast(10)");
        assert_eq!(filters, vec![Filter::Blur(1.5), Filter::Contrast(10.0)]);
    }

    #[test]
    fn unknown_filters_never_fail_the_pass() {
        let processor = TextureProcessor::default();
        let tex = texture(8, 8);
        let filtered = processor.apply_filters(&tex, "sepia(1) glow(2)");
        assert!(filtered.loaded);
    }
}
