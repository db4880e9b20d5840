//! The font-resource registry
//!
//! The renderer never loads or validates font files; it reads resolved
//! faces out of this registry. The font subsystem (upload, storage,
//! dedup) owns registration; the core only resolves. This replaces the
//! implicit document-level font registry of browser environments with an
//! explicitly constructed, explicitly owned object.

use parking_lot::RwLock;
use scrawl_core::error::{FontError, Result};
use scrawl_core::FontFace;
use skrifa::instance::{LocationRef, Size};
use skrifa::MetadataProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// A parsed, ready-to-render font face
///
/// Owns its bytes; metric queries reparse with skrifa per call, which is
/// cheap (table directory walk) and keeps the struct free of
/// self-referential lifetimes.
pub struct LoadedFace {
    family: String,
    data: Vec<u8>,
    units_per_em: u16,
    loaded: bool,
}

impl LoadedFace {
    /// Parse font bytes into a face. Fails if skrifa cannot read the
    /// table directory.
    pub fn from_bytes(family: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let family = family.into();
        let font = skrifa::FontRef::new(&data)
            .map_err(|e| FontError::Parse(format!("{family}: {e}")))?;
        let units_per_em = font.metrics(Size::unscaled(), LocationRef::default()).units_per_em;
        Ok(Self {
            family,
            data,
            units_per_em,
            loaded: true,
        })
    }

    fn font(&self) -> Option<skrifa::FontRef<'_>> {
        skrifa::FontRef::new(&self.data).ok()
    }
}

impl FontFace for LoadedFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        self.font()?.charmap().map(ch).map(|gid| gid.to_u32())
    }

    fn advance_width(&self, glyph_id: u32, size: f32) -> f32 {
        self.font()
            .and_then(|f| {
                f.glyph_metrics(Size::new(size), LocationRef::default())
                    .advance_width(skrifa::GlyphId::new(glyph_id))
            })
            .unwrap_or(size * 0.5)
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font()
            .map(|f| f.metrics(Size::new(size), LocationRef::default()).ascent)
            .unwrap_or(size * 0.8)
    }

    fn descent(&self, size: f32) -> f32 {
        self.font()
            .map(|f| {
                f.metrics(Size::new(size), LocationRef::default())
                    .descent
                    .abs()
            })
            .unwrap_or(size * 0.2)
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Logical family name -> resolved face
///
/// Created by the application, handed by reference to anyone who renders.
pub struct FontRegistry {
    faces: RwLock<HashMap<String, Arc<dyn FontFace>>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self {
            faces: RwLock::new(HashMap::new()),
        }
    }

    /// Register already-loaded font bytes under a family name.
    pub fn register(&self, family: &str, data: Vec<u8>) -> Result<Arc<dyn FontFace>> {
        let face = LoadedFace::from_bytes(family, data)?;
        log::debug!(
            "registered font '{}' ({} bytes, {} upem)",
            family,
            face.data.len(),
            face.units_per_em
        );
        let face: Arc<dyn FontFace> = Arc::new(face);
        self.faces
            .write()
            .insert(family.to_string(), face.clone());
        Ok(face)
    }

    /// Register a pre-built face, e.g. a test double.
    pub fn register_face(&self, family: &str, face: Arc<dyn FontFace>) {
        self.faces.write().insert(family.to_string(), face);
    }

    pub fn resolve(&self, family: &str) -> Result<Arc<dyn FontFace>> {
        self.faces
            .read()
            .get(family)
            .cloned()
            .ok_or_else(|| FontError::NotRegistered(family.to_string()).into())
    }

    pub fn is_registered(&self, family: &str) -> bool {
        self.faces.read().contains_key(family)
    }

    pub fn families(&self) -> Vec<String> {
        self.faces.read().keys().cloned().collect()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}
