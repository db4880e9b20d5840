//! The one-stop shop for paper textures

use crate::{PaperTexture, TextureCache, TextureLoader, TextureProcessor};
use scrawl_core::types::PaperTemplate;
use std::path::PathBuf;
use std::sync::Arc;

/// Orchestrates loader, cache, and processor behind one call
///
/// Owned by the application context and passed to whoever renders;
/// created at startup, dropped at teardown. There is no global instance.
pub struct PaperTextureManager {
    loader: TextureLoader,
    cache: TextureCache,
    processor: TextureProcessor,
    caching_enabled: bool,
}

impl PaperTextureManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader: TextureLoader::new(base_dir),
            cache: TextureCache::new(),
            processor: TextureProcessor::default(),
            caching_enabled: true,
        }
    }

    pub fn with_max_texture_size(mut self, max: u32) -> Self {
        self.processor = TextureProcessor::new(max);
        self
    }

    pub fn set_caching_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cache.clear();
        }
        self.caching_enabled = enabled;
    }

    /// Fetch the decoded texture for a template: cache hit returns
    /// immediately, a miss decodes and stores. Never fails; a template
    /// whose image cannot be decoded yields an unloaded texture.
    pub fn load_texture(&self, template: &PaperTemplate) -> Arc<PaperTexture> {
        if self.caching_enabled {
            if let Some(hit) = self.cache.get(&template.id) {
                log::trace!("texture cache hit for '{}'", template.id);
                return hit;
            }
        }
        let texture = Arc::new(self.loader.load(template));
        if self.caching_enabled && texture.loaded {
            self.cache.insert(texture.clone());
        }
        texture
    }

    pub fn processor(&self) -> &TextureProcessor {
        &self.processor
    }

    /// Release every cached texture.
    pub fn clear(&self) {
        self.cache.clear();
    }

    #[cfg(test)]
    fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::types::PaperKind;

    fn write_paper(dir: &std::path::Path, name: &str) {
        image::RgbaImage::from_pixel(8, 8, image::Rgba([245, 242, 230, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    fn template(id: &str, filename: &str) -> PaperTemplate {
        PaperTemplate::new(id, id, filename, PaperKind::Blank)
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_paper(dir.path(), "a.png");
        let manager = PaperTextureManager::new(dir.path());

        let first = manager.load_texture(&template("a", "a.png"));
        let second = manager.load_texture(&template("a", "a.png"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cached_count(), 1);
    }

    #[test]
    fn failed_decodes_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PaperTextureManager::new(dir.path());

        let texture = manager.load_texture(&template("ghost", "missing.png"));
        assert!(!texture.loaded);
        assert_eq!(manager.cached_count(), 0);
    }

    #[test]
    fn disabling_caching_clears_and_stops_storing() {
        let dir = tempfile::tempdir().unwrap();
        write_paper(dir.path(), "a.png");
        let mut manager = PaperTextureManager::new(dir.path());

        manager.load_texture(&template("a", "a.png"));
        manager.set_caching_enabled(false);
        assert_eq!(manager.cached_count(), 0);
        manager.load_texture(&template("a", "a.png"));
        assert_eq!(manager.cached_count(), 0);
    }
}
