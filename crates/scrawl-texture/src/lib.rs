//! Paper textures: decode, cache, process
//!
//! A [`PaperTemplate`] names an image file; this crate turns it into a
//! decoded [`PaperTexture`] the renderer can composite under ink. The
//! manager orchestrates three parts:
//!
//! - [`TextureLoader`] decodes the base image and an optional ruled-lines
//!   overlay. Decode failures never escape; they produce an unloaded
//!   texture so the renderer can fall back to synthesized flat paper.
//! - [`TextureCache`] keeps recently used templates decoded (small LRU).
//! - [`TextureProcessor`] rescales, degrades, and filters textures under
//!   the active quality profile.
//!
//! Ruled templates additionally carry line-alignment metadata in a JSON
//! sidecar, loaded and validated by [`TemplateMetadataStore`].

pub mod cache;
pub mod loader;
pub mod manager;
pub mod metadata;
pub mod processor;

pub use cache::TextureCache;
pub use loader::TextureLoader;
pub use manager::PaperTextureManager;
pub use metadata::{TemplateMetadata, TemplateMetadataStore};
pub use processor::TextureProcessor;

use image::RgbaImage;

/// A decoded paper background and its optional lines overlay
#[derive(Debug, Clone)]
pub struct PaperTexture {
    pub template_id: String,
    pub base: Option<RgbaImage>,
    pub lines: Option<RgbaImage>,
    /// False when decoding failed; the renderer synthesizes paper instead
    pub loaded: bool,
}

impl PaperTexture {
    /// Placeholder for a template whose image could not be decoded.
    pub fn unloaded(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            base: None,
            lines: None,
            loaded: false,
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.base.as_ref().map(|img| img.dimensions())
    }
}
