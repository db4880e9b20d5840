//! The seams between the pipeline's collaborators
//!
//! The renderer never loads fonts and never decodes images itself. It
//! reads font metrics through [`FontFace`] and receives paper pixels from
//! the texture crate. Both sides can be swapped without touching the
//! render loop.

use crate::error::Result;
use crate::types::BitmapData;
use crate::RenderConfig;

/// A resolved, ready-to-draw font face
///
/// Handles come out of the font registry owned by the font subsystem; the
/// core only reads them. Metric queries are in pixels at the requested
/// size so the layout code never touches font units.
pub trait FontFace: Send + Sync {
    /// The resolved family name this handle answers for
    fn family(&self) -> &str;

    /// Raw font bytes, for backends that rasterize outlines themselves
    fn data(&self) -> &[u8];

    /// The font's internal coordinate system scale
    fn units_per_em(&self) -> u16;

    /// Find the glyph for this character, `None` if the font lacks it
    fn glyph_id(&self, ch: char) -> Option<u32>;

    /// Horizontal advance of a glyph in pixels at `size`
    fn advance_width(&self, glyph_id: u32, size: f32) -> f32;

    /// Distance from baseline to the top of the tallest glyphs, in pixels
    fn ascent(&self, size: f32) -> f32 {
        size * 0.8
    }

    /// Distance from baseline to the lowest descender, in pixels (positive)
    fn descent(&self, size: f32) -> f32 {
        size * 0.2
    }

    /// Whether the face finished loading. Unloaded faces still answer
    /// metric queries with estimates so layout can proceed.
    fn is_loaded(&self) -> bool {
        true
    }
}

/// Anything that can turn a config into pixels
///
/// The base, progressive, and ruled renderers all implement this, so the
/// pipeline can pick one per page without caring which.
pub trait PageRender {
    fn name(&self) -> &'static str;

    fn render(&mut self, config: &RenderConfig) -> Result<BitmapData>;
}
