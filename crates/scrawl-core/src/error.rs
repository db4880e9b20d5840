//! Error types for Scrawl

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrawlError>;

/// Main error type for Scrawl
#[derive(Debug, Error)]
pub enum ScrawlError {
    #[error("Texture loading failed: {0}")]
    Texture(#[from] TextureError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Template metadata invalid: {0}")]
    Template(#[from] TemplateError),

    #[error("Font unavailable: {0}")]
    Font(#[from] FontError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScrawlError {
    /// Whether retrying the failed operation can plausibly succeed.
    ///
    /// Resource reads and decodes hiccup; malformed metadata and bad
    /// dimensions do not fix themselves.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrawlError::Io(_) => true,
            ScrawlError::Texture(e) => e.is_transient(),
            ScrawlError::Font(e) => matches!(e, FontError::NotLoaded(_)),
            ScrawlError::Render(e) => matches!(e, RenderError::Busy),
            _ => false,
        }
    }

    /// Capability-unavailable errors: the platform cannot render at all.
    /// These are the only errors allowed to surface as hard failures.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrawlError::Render(RenderError::SurfaceAllocation { .. }))
    }
}

/// Paper texture errors
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Texture file not found: {0}")]
    FileNotFound(String),

    #[error("Texture read failed: {0}")]
    ReadFailed(String),

    #[error("Texture decode failed: {0}")]
    DecodeFailed(String),

    #[error("Texture too large: {width}x{height} (max {max})")]
    TooLarge { width: u32, height: u32, max: u32 },
}

impl TextureError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TextureError::ReadFailed(_) | TextureError::DecodeFailed(_))
    }
}

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Surface allocation failed for {width}x{height}")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("Renderer is busy with an in-flight render")]
    Busy,

    #[error("Render cancelled after {chunks_done} chunks")]
    Cancelled { chunks_done: usize },

    #[error("Glyph {0} could not be drawn")]
    GlyphDraw(u32),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Canvas validation failed: {0}")]
    CanvasValidation(String),

    #[error("Format not supported: {0}")]
    FormatNotSupported(String),

    #[error("Canvas conversion produced no data: {0}")]
    ConversionFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Download not supported: {0}")]
    DownloadUnsupported(String),
}

/// Ruled-template metadata errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Metadata file not found: {0}")]
    FileNotFound(String),

    #[error("Metadata parse failed: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid color for {field}: {value}")]
    InvalidColor { field: &'static str, value: String },
}

/// Font registry errors
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font family not registered: {0}")]
    NotRegistered(String),

    #[error("Font data could not be parsed: {0}")]
    Parse(String),

    #[error("Font not yet loaded: {0}")]
    NotLoaded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let decode: ScrawlError = TextureError::DecodeFailed("truncated png".into()).into();
        assert!(decode.is_transient());

        let dims: ScrawlError = RenderError::InvalidDimensions { width: 0, height: 0 }.into();
        assert!(!dims.is_transient());

        let format: ScrawlError = ExportError::FormatNotSupported("tiff".into()).into();
        assert!(!format.is_transient());
    }

    #[test]
    fn only_surface_allocation_is_fatal() {
        let alloc: ScrawlError = RenderError::SurfaceAllocation { width: 1, height: 1 }.into();
        assert!(alloc.is_fatal());

        let busy: ScrawlError = RenderError::Busy.into();
        assert!(!busy.is_fatal());
    }
}
