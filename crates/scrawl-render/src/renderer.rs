//! The base page renderer: paper, ink, grain

use crate::{glyph, layout, surface};
use scrawl_core::error::{RenderError, Result};
use scrawl_core::quality::{QualityPreset, QualitySettings};
use scrawl_core::traits::{FontFace, PageRender};
use scrawl_core::types::{BitmapData, PaperKind};
use scrawl_core::variation::char_seed;
use scrawl_core::variation::RangeOverrides;
use scrawl_core::{RenderConfig, StrategyKind, VariationEngine};
use scrawl_texture::{PaperTextureManager, TemplateMetadata};
use std::sync::Arc;
use tiny_skia::{BlendMode, Pixmap};

/// Text never renders smaller than this, regardless of surface size
const MIN_FONT_SIZE: f32 = 12.0;
/// And never larger than this fraction of the surface width
const MAX_FONT_FRACTION: f32 = 0.04;
/// Side and top margin as a fraction of the surface width
const MARGIN_FRACTION: f32 = 0.08;
/// Baseline-to-baseline distance in font sizes, free-flow mode
const LINE_HEIGHT_FACTOR: f32 = 1.6;
/// Hard ceiling on either surface dimension
const MAX_SURFACE_DIM: u32 = 8192;

/// Where a render stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering,
    Complete,
    /// Finished, but on synthesized paper because the texture was unusable
    FellBack,
    Failed,
}

/// How baselines are placed on the page
pub(crate) enum BaselineLayout {
    /// Evenly spaced from the top margin down
    Flow { next_y: f32, step: f32 },
    /// Snapped to the rule positions a lined template declares
    Ruled { meta: TemplateMetadata, scale: f32 },
}

/// An in-progress page: the surface plus resolved layout parameters
///
/// Produced by [`PageRenderer::begin`], filled by one or more
/// [`PageRenderer::draw_block`] calls, sealed by [`PageRenderer::finish`].
/// The progressive renderer leans on exactly this split.
pub(crate) struct RenderCanvas {
    pub(crate) pixmap: Pixmap,
    pub(crate) font_size: f32,
    pub(crate) margin_left: f32,
    pub(crate) max_text_width: f32,
    bottom: f32,
    line_index: usize,
    layout: BaselineLayout,
    blend: BlendMode,
    antialias: bool,
    realism: u8,
    /// Ruled pages halve the vertical jitter so ink stays on the rules
    jitter_scale: f32,
    fell_back: bool,
}

impl RenderCanvas {
    /// Claim the next baseline, or `None` once the page is full.
    fn advance_baseline(&mut self) -> Option<f32> {
        let y = match &mut self.layout {
            BaselineLayout::Flow { next_y, step } => {
                let y = *next_y;
                *next_y += *step;
                y
            },
            BaselineLayout::Ruled { meta, scale } => meta.baseline_y(self.line_index) * *scale,
        };
        self.line_index += 1;
        (y <= self.bottom).then_some(y)
    }
}

/// Renders one full page in a single pass
pub struct PageRenderer<'a> {
    face: Arc<dyn FontFace>,
    textures: Option<&'a PaperTextureManager>,
    engine: VariationEngine,
    settings: QualitySettings,
    state: RenderState,
}

impl<'a> PageRenderer<'a> {
    pub fn new(face: Arc<dyn FontFace>) -> Self {
        Self {
            face,
            textures: None,
            engine: VariationEngine::new(StrategyKind::Realistic, 0),
            settings: QualitySettings::for_tier(QualityPreset::High),
            state: RenderState::Idle,
        }
    }

    /// Use decoded paper textures from this manager. Without one, every
    /// page gets synthesized paper.
    pub fn with_textures(mut self, manager: &'a PaperTextureManager) -> Self {
        self.textures = Some(manager);
        self
    }

    pub fn with_settings(mut self, settings: QualitySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_strategy(mut self, kind: StrategyKind) -> Self {
        self.engine = VariationEngine::new(kind, 0);
        self
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn settings(&self) -> QualitySettings {
        self.settings
    }

    /// Allocate the surface, lay down the paper layer, and resolve the
    /// layout parameters. `ruled` switches baseline placement to the
    /// template's declared rule positions.
    pub(crate) fn begin(
        &mut self,
        config: &RenderConfig,
        ruled: Option<TemplateMetadata>,
    ) -> Result<RenderCanvas> {
        if config.canvas_width == 0 || config.canvas_height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: config.canvas_width,
                height: config.canvas_height,
            }
            .into());
        }

        let scale = self.settings.rendering_quality * config.quality;
        let width = ((config.canvas_width as f32 * scale).round() as u32).clamp(16, MAX_SURFACE_DIM);
        let height =
            ((config.canvas_height as f32 * scale).round() as u32).clamp(16, MAX_SURFACE_DIM);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or(RenderError::SurfaceAllocation { width, height })?;
        // Effective surface scale after clamping
        let scale = width as f32 / config.canvas_width as f32;

        self.engine.set_base_ink(config.ink_color);
        self.engine.configure_ranges(RangeOverrides {
            baseline_jitter: Some(config.baseline_jitter),
            slant_jitter: Some(config.slant_jitter),
            micro_tilt: Some(config.micro_tilt),
            color_intensity: Some(config.color_intensity),
        });

        let kind = config
            .template
            .as_ref()
            .map(|t| t.kind)
            .unwrap_or(PaperKind::Blank);

        let mut drew_texture = false;
        if let (Some(manager), Some(template)) = (self.textures, config.template.as_ref()) {
            let texture = manager.load_texture(template);
            let texture = manager
                .processor()
                .adjust_quality(&texture, self.settings.texture_quality);
            if let Some(base) = texture.base.as_ref() {
                drew_texture = surface::draw_cover(&mut pixmap, base);
                if let Some(lines) = texture.lines.as_ref() {
                    surface::draw_cover(&mut pixmap, lines);
                }
            }
        }
        let fell_back = !drew_texture && config.template.is_some();
        if !drew_texture {
            match &ruled {
                // With rule metadata in hand, synthesize rules where the
                // baselines will actually land
                Some(meta) => {
                    surface::synthesize_paper(&mut pixmap, PaperKind::Blank);
                    surface::draw_rules(
                        &mut pixmap,
                        (meta.margin_top + meta.line_height) * scale,
                        (meta.line_height + meta.line_spacing) * scale,
                        meta.line_color,
                    );
                },
                None => surface::synthesize_paper(&mut pixmap, kind),
            }
            if fell_back {
                log::warn!(
                    "texture unavailable for template '{}', using synthesized paper",
                    config.template.as_ref().map(|t| t.id.as_str()).unwrap_or("")
                );
            }
        }

        let w = width as f32;
        let h = height as f32;
        let font_size = (config.font_size * scale).clamp(MIN_FONT_SIZE, (w * MAX_FONT_FRACTION).max(MIN_FONT_SIZE));
        let margin = w * MARGIN_FRACTION;

        let (margin_left, max_text_width, bottom, layout, jitter_scale) = match ruled {
            Some(meta) => {
                let left = (meta.margin_left * scale).max(margin * 0.5);
                let right = meta.margin_right * scale;
                let bottom = h - (meta.margin_bottom * scale).max(4.0);
                (
                    left,
                    (w - left - right).max(font_size),
                    bottom,
                    BaselineLayout::Ruled { meta, scale },
                    0.5,
                )
            },
            None => {
                let first = margin + self.face.ascent(font_size);
                (
                    margin,
                    (w - margin * 2.0).max(font_size),
                    h - margin,
                    BaselineLayout::Flow {
                        next_y: first,
                        step: font_size * LINE_HEIGHT_FACTOR,
                    },
                    1.0,
                )
            },
        };

        Ok(RenderCanvas {
            pixmap,
            font_size,
            margin_left,
            max_text_width,
            bottom,
            line_index: 0,
            layout,
            blend: if self.settings.blending {
                surface::blend_mode(config.blend)
            } else {
                BlendMode::SourceOver
            },
            antialias: self.settings.antialiasing,
            realism: config.realism,
            jitter_scale,
            fell_back,
        })
    }

    /// Wrap and draw one block of text, continuing from the canvas's
    /// current line. Overflowing lines are dropped with a warning; a
    /// page's content is bounded by the splitter upstream.
    pub(crate) fn draw_block(&mut self, canvas: &mut RenderCanvas, text: &str) {
        let lines = layout::wrap_text(text, self.face.as_ref(), canvas.font_size, canvas.max_text_width);
        for (drawn, line) in lines.iter().enumerate() {
            let Some(baseline) = canvas.advance_baseline() else {
                log::warn!("page full, dropping {} wrapped line(s)", lines.len() - drawn);
                break;
            };
            let line_no = canvas.line_index - 1;
            let mut pen_x = canvas.margin_left;
            for (col, ch) in line.chars().enumerate() {
                let seed = char_seed(line_no, col, ch);
                let advance =
                    layout::char_width(self.face.as_ref(), ch, canvas.font_size);
                if ch.is_whitespace() {
                    let mut rng = fastrand::Rng::with_seed(seed);
                    pen_x += advance * (0.95 + rng.f32() * 0.1);
                    continue;
                }
                self.engine.reseed(seed);
                let mut variation = self.engine.variation(ch, col);
                variation.baseline_jitter *= canvas.jitter_scale;
                glyph::draw_char(
                    &mut canvas.pixmap,
                    self.face.as_ref(),
                    ch,
                    pen_x,
                    baseline,
                    canvas.font_size,
                    &variation,
                    canvas.blend,
                    canvas.antialias,
                );
                // Pen breathing: each advance stretches a little
                let mut rng = fastrand::Rng::with_seed(seed.rotate_left(17));
                pen_x += advance * (0.97 + rng.f32() * 0.06);
            }
        }
    }

    /// Grain passes, then hand the pixels back. The bool reports whether
    /// the paper layer fell back to synthesized.
    pub(crate) fn finish(&mut self, canvas: RenderCanvas) -> (BitmapData, bool) {
        let RenderCanvas {
            mut pixmap,
            realism,
            fell_back,
            ..
        } = canvas;
        surface::grain_passes(&mut pixmap, realism);
        (surface::pixmap_to_bitmap(pixmap), fell_back)
    }

    fn render_inner(&mut self, config: &RenderConfig) -> Result<(BitmapData, bool)> {
        let config = config.sanitized();
        let mut canvas = self.begin(&config, None)?;
        self.draw_block(&mut canvas, &config.text);
        Ok(self.finish(canvas))
    }
}

impl PageRender for PageRenderer<'_> {
    fn name(&self) -> &'static str {
        "page"
    }

    fn render(&mut self, config: &RenderConfig) -> Result<BitmapData> {
        if self.state == RenderState::Rendering {
            return Err(RenderError::Busy.into());
        }
        self.state = RenderState::Rendering;
        match self.render_inner(config) {
            Ok((bitmap, fell_back)) => {
                self.state = if fell_back {
                    RenderState::FellBack
                } else {
                    RenderState::Complete
                };
                Ok(bitmap)
            },
            Err(e) => {
                self.state = RenderState::Failed;
                Err(e)
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use scrawl_core::types::{PaperTemplate, PaperKind};

    /// Deterministic face backed by no real font; glyphs use the
    /// fallback mark, advances are fixed fractions of the size.
    pub(crate) struct FixedFace;

    impl FontFace for FixedFace {
        fn family(&self) -> &str {
            "fixed-test"
        }

        fn data(&self) -> &[u8] {
            &[]
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, ch: char) -> Option<u32> {
            Some(ch as u32)
        }

        fn advance_width(&self, _glyph_id: u32, size: f32) -> f32 {
            size * 0.55
        }
    }

    pub(crate) fn test_config(text: &str) -> RenderConfig {
        RenderConfig {
            canvas_width: 200,
            canvas_height: 280,
            text: text.to_string(),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn rendering_text_changes_the_paper() {
        let mut renderer = PageRenderer::new(Arc::new(FixedFace));
        let blank = renderer.render(&test_config("")).unwrap();
        let mut renderer = PageRenderer::new(Arc::new(FixedFace));
        let inked = renderer.render(&test_config("hello world")).unwrap();
        assert_eq!(blank.width, inked.width);
        assert_ne!(blank.data, inked.data);
        assert_eq!(renderer.state(), RenderState::Complete);
    }

    #[test]
    fn same_config_renders_identically() {
        let config = test_config("The quick brown fox");
        let mut a = PageRenderer::new(Arc::new(FixedFace));
        let mut b = PageRenderer::new(Arc::new(FixedFace));
        assert_eq!(a.render(&config).unwrap().data, b.render(&config).unwrap().data);
    }

    #[test]
    fn surface_tracks_quality_scale() {
        let mut renderer = PageRenderer::new(Arc::new(FixedFace))
            .with_settings(QualitySettings::for_tier(QualityPreset::Low));
        let bitmap = renderer.render(&test_config("hi")).unwrap();
        // Low tier halves the surface
        assert_eq!(bitmap.width, 100);
        assert_eq!(bitmap.height, 140);
    }

    #[test]
    fn zero_dimensions_fail_and_mark_the_state() {
        let mut renderer = PageRenderer::new(Arc::new(FixedFace));
        let mut config = test_config("x");
        config.canvas_width = 0;
        assert!(renderer.render(&config).is_err());
        assert_eq!(renderer.state(), RenderState::Failed);
    }

    #[test]
    fn missing_texture_falls_back_to_synthesized_paper() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PaperTextureManager::new(dir.path());
        let mut renderer = PageRenderer::new(Arc::new(FixedFace)).with_textures(&manager);

        let mut config = test_config("note");
        config.template = Some(PaperTemplate::new(
            "ghost",
            "Ghost",
            "missing.png",
            PaperKind::Lined,
        ));
        let bitmap = renderer.render(&config).unwrap();
        assert!(!bitmap.is_empty());
        assert_eq!(renderer.state(), RenderState::FellBack);
    }

    #[test]
    fn texture_paper_is_composited_when_present() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(32, 32, image::Rgba([210, 200, 160, 255]))
            .save(dir.path().join("kraft.png"))
            .unwrap();
        let manager = PaperTextureManager::new(dir.path());
        let mut renderer = PageRenderer::new(Arc::new(FixedFace)).with_textures(&manager);

        let mut config = test_config("");
        config.template = Some(PaperTemplate::new(
            "kraft",
            "Kraft",
            "kraft.png",
            PaperKind::Blank,
        ));
        renderer.render(&config).unwrap();
        assert_eq!(renderer.state(), RenderState::Complete);
    }
}
