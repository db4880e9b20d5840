//! Decoding template images from disk
//!
//! The loader is a never-throw boundary: whatever goes wrong underneath
//! (missing file, truncated image, unsupported codec), the caller gets a
//! `PaperTexture` back. Failures just leave it unloaded.

use crate::PaperTexture;
use image::RgbaImage;
use scrawl_core::types::PaperTemplate;
use std::path::{Path, PathBuf};

/// Reads and decodes paper images for templates
pub struct TextureLoader {
    base_dir: PathBuf,
}

impl TextureLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Decode the template's base image and, if one exists next to it,
    /// its `<stem>-lines.<ext>` overlay.
    pub fn load(&self, template: &PaperTemplate) -> PaperTexture {
        let base_path = self.base_dir.join(&template.filename);
        let base = match decode(&base_path) {
            Some(img) => img,
            None => {
                log::warn!(
                    "texture for template '{}' failed to decode, using unloaded placeholder",
                    template.id
                );
                return PaperTexture::unloaded(&template.id);
            },
        };

        let lines = lines_companion(&base_path).and_then(|p| decode(&p));
        if lines.is_some() {
            log::debug!("template '{}' has a lines overlay", template.id);
        }

        PaperTexture {
            template_id: template.id.clone(),
            base: Some(base),
            lines,
            loaded: true,
        }
    }
}

fn decode(path: &Path) -> Option<RgbaImage> {
    if !path.exists() {
        return None;
    }
    match image::open(path) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            log::warn!("failed to decode {}: {e}", path.display());
            None
        },
    }
}

/// `paper.png` -> `paper-lines.png`
fn lines_companion(base: &Path) -> Option<PathBuf> {
    let stem = base.file_stem()?.to_str()?;
    let ext = base.extension()?.to_str()?;
    Some(base.with_file_name(format!("{stem}-lines.{ext}")))
}
