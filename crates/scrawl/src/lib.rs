//! Scrawl: text in, handwritten pages out
//!
//! This crate ties the pipeline together behind one context object:
//!
//! ```no_run
//! use scrawl::prelude::*;
//!
//! # fn main() -> scrawl_core::Result<()> {
//! let scrawl = Scrawl::builder("assets/paper").build();
//! scrawl.register_font("Caveat", std::fs::read("Caveat.ttf")?)?;
//!
//! let config = RenderConfig {
//!     text: "Dear reader, this is not a typeface.".to_string(),
//!     font_family: "Caveat".to_string(),
//!     ..RenderConfig::default()
//! };
//! let document = scrawl.render_document(&config)?;
//! let blobs = scrawl.export_pages(&document, ExportFormat::Png);
//! # Ok(())
//! # }
//! ```
//!
//! Every page goes through the recovery ladder: the preferred renderer
//! first (ruled for lined templates with metadata, progressive for long
//! text), a textureless fallback next, and a minimal low-quality pass as
//! the emergency exit. Only capability-fatal failures surface as errors.

use parking_lot::Mutex;
use scrawl_core::error::{Result, ScrawlError};
use scrawl_core::quality::{
    DeviceProfile, PerformanceReport, QualityController, QualityPreset, QualitySettings,
};
use scrawl_core::recovery::{render_with_recovery, with_retry, RenderPath, RetryPolicy};
use scrawl_core::traits::{FontFace, PageRender};
use scrawl_core::types::{BitmapData, DownloadResult, ExportResult, PaperKind};
use scrawl_core::{split_into_pages, ExportFormat, PageSplit, PageSplitOptions, RenderConfig, StrategyKind};
use scrawl_export::{BulkDownloadManager, DownloadManager, PageExporter};
use scrawl_fonts::FontRegistry;
use scrawl_render::{PageRenderer, ProgressiveRenderer, RuledRenderer};
use scrawl_texture::{PaperTextureManager, TemplateMetadataStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod prelude;

/// Texts at least this many characters long use the progressive renderer
const PROGRESSIVE_THRESHOLD: usize = 1000;

/// A fully rendered document
#[derive(Debug)]
pub struct RenderedDocument {
    pub pages: Vec<BitmapData>,
    pub split: PageSplit,
    /// How many pages needed the fallback or emergency path
    pub fallback_pages: usize,
}

/// Configures and creates a [`Scrawl`] context
pub struct ScrawlBuilder {
    paper_dir: PathBuf,
    metadata_dir: Option<PathBuf>,
    preset: QualityPreset,
    device: Option<DeviceProfile>,
    retry: RetryPolicy,
    strategy: StrategyKind,
}

impl ScrawlBuilder {
    /// Rule metadata sidecars live here; defaults to the paper directory.
    pub fn metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    pub fn quality_preset(mut self, preset: QualityPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn device_profile(mut self, device: DeviceProfile) -> Self {
        self.device = Some(device);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn variation_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Scrawl {
        let metadata_dir = self.metadata_dir.unwrap_or_else(|| self.paper_dir.clone());
        let device = self.device.unwrap_or_else(DeviceProfile::detect);
        Scrawl {
            textures: PaperTextureManager::new(&self.paper_dir),
            metadata: TemplateMetadataStore::new(metadata_dir),
            fonts: FontRegistry::new(),
            exporter: PageExporter::new(),
            quality: Mutex::new(QualityController::new(self.preset, device)),
            retry: self.retry,
            strategy: self.strategy,
        }
    }
}

/// The application context: owns every subsystem, no globals
pub struct Scrawl {
    textures: PaperTextureManager,
    metadata: TemplateMetadataStore,
    fonts: FontRegistry,
    exporter: PageExporter,
    quality: Mutex<QualityController>,
    retry: RetryPolicy,
    strategy: StrategyKind,
}

impl Scrawl {
    /// Start building a context around a paper-texture directory.
    pub fn builder(paper_dir: impl Into<PathBuf>) -> ScrawlBuilder {
        ScrawlBuilder {
            paper_dir: paper_dir.into(),
            metadata_dir: None,
            preset: QualityPreset::Auto,
            device: None,
            retry: RetryPolicy::default(),
            strategy: StrategyKind::Realistic,
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn textures(&self) -> &PaperTextureManager {
        &self.textures
    }

    pub fn register_font(&self, family: &str, data: Vec<u8>) -> Result<()> {
        self.fonts.register(family, data)?;
        Ok(())
    }

    pub fn quality_settings(&self) -> QualitySettings {
        self.quality.lock().settings()
    }

    pub fn set_quality_preset(&self, preset: QualityPreset) {
        self.quality.lock().set_preset(preset);
    }

    /// Feed a performance report into the quality ladder.
    pub fn observe_performance(&self, report: &PerformanceReport) -> bool {
        self.quality.lock().observe(report)
    }

    /// Out-of-band memory-pressure signal, 0.0 to 1.0.
    pub fn memory_pressure(&self, level: f32) -> bool {
        self.quality.lock().memory_pressure(level)
    }

    /// Split, render, and recover every page of a document.
    pub fn render_document(&self, config: &RenderConfig) -> Result<RenderedDocument> {
        let config = config.sanitized();
        let face = self.fonts.resolve(&config.font_family)?;

        let split = split_into_pages(
            &config.text,
            &PageSplitOptions {
                words_per_page: config.words_per_page,
                max_pages: config.max_pages,
                truncate: true,
            },
        );
        if split.truncated {
            log::warn!(
                "document truncated at {} pages, {} word(s) dropped",
                split.total_pages,
                split.remaining_words.unwrap_or(0)
            );
        }

        // An empty document still produces one blank page
        let page_texts: Vec<&str> = if split.pages.is_empty() {
            vec![""]
        } else {
            split.pages.iter().map(String::as_str).collect()
        };

        let mut pages = Vec::with_capacity(page_texts.len());
        let mut fallback_pages = 0usize;
        for (index, page_text) in page_texts.iter().enumerate() {
            let mut page_config = config.clone();
            page_config.text = (*page_text).to_string();
            let (bitmap, path) = self.render_one(&face, &page_config)?;
            if path != RenderPath::Primary {
                log::warn!("page {} rendered via {:?}", index + 1, path);
                fallback_pages += 1;
            }
            pages.push(bitmap);
        }

        Ok(RenderedDocument {
            pages,
            split,
            fallback_pages,
        })
    }

    /// Render a single page config through the full recovery ladder.
    pub fn render_page(&self, config: &RenderConfig) -> Result<BitmapData> {
        let config = config.sanitized();
        let face = self.fonts.resolve(&config.font_family)?;
        self.render_one(&face, &config).map(|(bitmap, _)| bitmap)
    }

    fn render_one(
        &self,
        face: &Arc<dyn FontFace>,
        config: &RenderConfig,
    ) -> Result<(BitmapData, RenderPath)> {
        let settings = self.quality_settings();

        let primary = || {
            with_retry(
                || self.render_primary(face, config, settings),
                "page-render",
                &self.retry,
            )
            .value
        };

        let fallback = |_: &ScrawlError| {
            // Synthesized paper only; texture trouble cannot follow us here
            let mut plain = config.clone();
            plain.template = None;
            let mut renderer = PageRenderer::new(face.clone())
                .with_settings(settings)
                .with_strategy(self.strategy);
            renderer.render(&plain)
        };

        let emergency = || {
            // Bare minimum: low tier, flat paper, neutral variation
            let mut minimal = config.clone();
            minimal.template = None;
            minimal.baseline_jitter = 0.0;
            minimal.slant_jitter = 0.0;
            minimal.micro_tilt = 0.0;
            minimal.color_intensity = 0.0;
            minimal.realism = 5;
            let mut renderer = PageRenderer::new(face.clone())
                .with_settings(QualitySettings::for_tier(QualityPreset::Low));
            renderer.render(&minimal)
        };

        let recovered = render_with_recovery(primary, fallback, Some(emergency));
        let path = recovered.path;
        match recovered.value {
            Some(bitmap) => Ok((bitmap, path)),
            None => Err(recovered
                .error
                .unwrap_or_else(|| ScrawlError::Other("render produced no output".to_string()))),
        }
    }

    /// The preferred renderer for this config: ruled when a lined
    /// template carries usable metadata, progressive for long texts,
    /// otherwise the base single-pass renderer.
    fn render_primary(
        &self,
        face: &Arc<dyn FontFace>,
        config: &RenderConfig,
        settings: QualitySettings,
    ) -> Result<BitmapData> {
        let base = PageRenderer::new(face.clone())
            .with_textures(&self.textures)
            .with_settings(settings)
            .with_strategy(self.strategy);

        if let Some(template) = &config.template {
            if template.kind == PaperKind::Lined {
                match self.metadata.load(&template.id) {
                    Ok(meta) => {
                        return RuledRenderer::new(base).with_metadata(meta).render(config);
                    },
                    Err(e) => {
                        log::debug!("no usable rule metadata for '{}': {e}", template.id);
                    },
                }
            }
        }

        if settings.progressive_loading && config.text.chars().count() >= PROGRESSIVE_THRESHOLD {
            let mut progressive = ProgressiveRenderer::new(base);
            return progressive.render(config);
        }

        let mut base = base;
        base.render(config)
    }

    /// Encode every page of a rendered document. Per-page failures stay
    /// inside their [`ExportResult`].
    pub fn export_pages(&self, document: &RenderedDocument, format: ExportFormat) -> Vec<ExportResult> {
        let quality = self.quality_settings().compression_level;
        self.exporter
            .batch_to_blobs(&document.pages, format, quality)
    }

    pub fn exporter(&self) -> &PageExporter {
        &self.exporter
    }

    /// Write each exported page as its own file under `dir`.
    pub fn download_pages(
        &self,
        results: &[ExportResult],
        dir: impl AsRef<Path>,
        stem: &str,
    ) -> Vec<DownloadResult> {
        let downloads = DownloadManager::new(dir.as_ref());
        results
            .iter()
            .enumerate()
            .map(|(index, result)| match result.blob.as_ref() {
                Some(blob) => downloads.download(
                    &format!("{stem}_{:03}.{}", index + 1, result.format.extension()),
                    blob,
                ),
                None => DownloadResult {
                    filename: format!("{stem}_{:03}", index + 1),
                    size: 0,
                    success: false,
                    error: result.error.clone(),
                },
            })
            .collect()
    }

    /// Bundle every exported page into `<stem>.tar.gz` under `dir`.
    pub fn download_archive(
        &self,
        results: &[ExportResult],
        dir: impl AsRef<Path>,
        stem: &str,
    ) -> DownloadResult {
        BulkDownloadManager::new(DownloadManager::new(dir.as_ref()))
            .download_archive(results, stem)
    }
}
