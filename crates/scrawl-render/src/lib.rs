//! The compositing renderers: paper below, jittered ink above
//!
//! Three renderers share one drawing core:
//!
//! - [`PageRenderer`] composites a full page in one pass: paper layer
//!   (decoded texture or synthesized), multiply-blended ink with
//!   per-character variation, then a few low-alpha grain passes.
//! - [`ProgressiveRenderer`] draws the same page in cancellable chunks,
//!   split at sentence boundaries, for long documents.
//! - [`RuledRenderer`] snaps baselines to the rule positions a lined
//!   template declares in its metadata sidecar.
//!
//! Glyph outlines come from skrifa and are filled with tiny-skia; a font
//! without a usable outline still produces ink via a fallback mark, so a
//! page never comes back blank.

pub mod glyph;
pub mod layout;
pub mod progressive;
pub mod renderer;
pub mod ruled;
mod surface;

pub use progressive::{chunk_text, CancelToken, ProgressiveRenderer};
pub use renderer::{PageRenderer, RenderState};
pub use ruled::RuledRenderer;
