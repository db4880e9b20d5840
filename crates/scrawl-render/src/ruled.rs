//! Baseline-snapped rendering for lined paper

use crate::renderer::PageRenderer;
use scrawl_core::error::Result;
use scrawl_core::traits::PageRender;
use scrawl_core::types::BitmapData;
use scrawl_core::RenderConfig;
use scrawl_texture::TemplateMetadata;

/// Places each line of text on the rules a lined template declares
///
/// Vertical jitter is halved so the writing visibly sits on the rules.
/// Without metadata this renderer degrades to the base algorithm, which
/// is always a usable page.
pub struct RuledRenderer<'a> {
    inner: PageRenderer<'a>,
    metadata: Option<TemplateMetadata>,
}

impl<'a> RuledRenderer<'a> {
    pub fn new(inner: PageRenderer<'a>) -> Self {
        Self {
            inner,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: TemplateMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata(&self) -> Option<&TemplateMetadata> {
        self.metadata.as_ref()
    }
}

impl PageRender for RuledRenderer<'_> {
    fn name(&self) -> &'static str {
        "ruled"
    }

    fn render(&mut self, config: &RenderConfig) -> Result<BitmapData> {
        let Some(metadata) = self.metadata.clone() else {
            log::debug!("no rule metadata, rendering with free-flow baselines");
            return self.inner.render(config);
        };
        let config = config.sanitized();
        let mut canvas = self.inner.begin(&config, Some(metadata))?;
        self.inner.draw_block(&mut canvas, &config.text);
        let (bitmap, _) = self.inner.finish(canvas);
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::tests::{test_config, FixedFace};
    use scrawl_core::Color;
    use std::sync::Arc;

    fn metadata() -> TemplateMetadata {
        TemplateMetadata {
            line_height: 32.0,
            margin_top: 40.0,
            margin_left: 30.0,
            margin_right: 10.0,
            margin_bottom: 20.0,
            line_spacing: 0.0,
            line_color: Color::rgb(176, 196, 222),
            has_margin_line: false,
            margin_line_position: 0.0,
            margin_line_color: Color::rgb(229, 115, 115),
            baseline_offset: 24.0,
        }
    }

    #[test]
    fn snapped_baselines_differ_from_free_flow() {
        let config = test_config("lined up text here");
        let mut ruled =
            RuledRenderer::new(PageRenderer::new(Arc::new(FixedFace))).with_metadata(metadata());
        let mut base = PageRenderer::new(Arc::new(FixedFace));
        assert_ne!(
            ruled.render(&config).unwrap().data,
            base.render(&config).unwrap().data
        );
    }

    #[test]
    fn missing_metadata_degrades_to_the_base_algorithm() {
        let config = test_config("plain fallback");
        let mut ruled = RuledRenderer::new(PageRenderer::new(Arc::new(FixedFace)));
        let mut base = PageRenderer::new(Arc::new(FixedFace));
        assert_eq!(
            ruled.render(&config).unwrap().data,
            base.render(&config).unwrap().data
        );
    }

    #[test]
    fn ruled_rendering_is_deterministic() {
        let config = test_config("same ink twice");
        let mut a =
            RuledRenderer::new(PageRenderer::new(Arc::new(FixedFace))).with_metadata(metadata());
        let mut b =
            RuledRenderer::new(PageRenderer::new(Arc::new(FixedFace))).with_metadata(metadata());
        assert_eq!(a.render(&config).unwrap().data, b.render(&config).unwrap().data);
    }
}
