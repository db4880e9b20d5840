//! Scrawl Core: text in, handwritten pages out
//!
//! This crate holds the shared vocabulary of the Scrawl pipeline and the
//! pieces of it that are pure computation:
//!
//! 1. **Page splitting** - Raw text becomes bounded pages
//! 2. **Variation** - Each character receives randomized-but-bounded jitter
//! 3. **Quality adaptation** - A degradation ladder reacts to live
//!    performance reports
//! 4. **Recovery** - Retry with backoff and tiered render fallbacks
//!
//! The raster work (paper compositing, glyph drawing) lives in
//! `scrawl-render`; texture decode and caching in `scrawl-texture`;
//! encoding and delivery in `scrawl-export`. Everything communicates
//! through the types defined here.

pub mod error;
pub mod pages;
pub mod quality;
pub mod recovery;
pub mod traits;
pub mod variation;

pub use error::{Result, ScrawlError};
pub use pages::{estimate_page_count, split_into_pages, PageSplit, PageSplitOptions};
pub use traits::FontFace;
pub use variation::{StrategyKind, VariationEngine};

/// The data structures that flow through the pipeline
pub mod types {
    /// Raw pixel data from a finished render, always RGBA8
    #[derive(Debug, Clone)]
    pub struct BitmapData {
        pub width: u32,
        pub height: u32,
        pub data: Vec<u8>,
    }

    impl BitmapData {
        pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
            Self { width, height, data }
        }

        pub fn is_empty(&self) -> bool {
            self.width == 0 || self.height == 0
        }
    }

    /// How the ink layer combines with the paper beneath it
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum InkBlend {
        /// Ink darkens paper instead of replacing it
        #[default]
        Multiply,
        Darken,
        Overlay,
        SourceOver,
    }

    /// Which kind of paper a template describes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PaperKind {
        Blank,
        Lined,
    }

    /// A selectable paper background, immutable once created
    #[derive(Debug, Clone, PartialEq)]
    pub struct PaperTemplate {
        pub id: String,
        pub name: String,
        pub filename: String,
        pub kind: PaperKind,
    }

    impl PaperTemplate {
        pub fn new(
            id: impl Into<String>,
            name: impl Into<String>,
            filename: impl Into<String>,
            kind: PaperKind,
        ) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                filename: filename.into(),
                kind,
            }
        }
    }

    /// Per-character transform parameters, produced fresh per render
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct TextVariation {
        /// Vertical offset from the nominal baseline, in pixels
        pub baseline_jitter: f32,
        /// Slant applied to the glyph, in radians
        pub slant_jitter: f32,
        /// Additional rotation noise, in radians
        pub micro_tilt: f32,
        /// Resolved per-character ink color
        pub color: super::Color,
    }

    impl TextVariation {
        /// The neutral variation: no offsets, base ink untouched.
        /// Whitespace always gets this.
        pub fn none(color: super::Color) -> Self {
            Self {
                baseline_jitter: 0.0,
                slant_jitter: 0.0,
                micro_tilt: 0.0,
                color,
            }
        }
    }

    /// Outcome of encoding one rendered page
    #[derive(Debug, Clone)]
    pub struct ExportResult {
        pub blob: Option<Vec<u8>>,
        pub format: super::ExportFormat,
        pub size: usize,
        pub width: u32,
        pub height: u32,
        pub success: bool,
        pub error: Option<String>,
    }

    /// Outcome of delivering one blob to the user
    #[derive(Debug, Clone)]
    pub struct DownloadResult {
        pub filename: String,
        pub size: usize,
        pub success: bool,
        pub error: Option<String>,
    }
}

/// Simple RGBA color that works everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgba(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::rgba(255, 255, 255, 255)
    }

    /// Classic blue-black fountain pen ink
    pub const fn ink_blue() -> Self {
        Self::rgba(26, 35, 126, 255)
    }

    /// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let r = byte(0)?;
        let g = byte(2)?;
        let b = byte(4)?;
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Some(Self::rgba(r, g, b, a))
    }

    /// Shift each RGB channel by a signed delta, clamped to [0, 255].
    pub fn shifted(self, dr: i16, dg: i16, db: i16) -> Self {
        let clamp = |v: u8, d: i16| (v as i16 + d).clamp(0, 255) as u8;
        Self {
            r: clamp(self.r, dr),
            g: clamp(self.g, dg),
            b: clamp(self.b, db),
            a: self.a,
        }
    }
}

/// Supported export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    /// Normalize a user-supplied format name. Unknown or unsupported
    /// names fall back to PNG rather than failing.
    pub fn normalize(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            other => {
                log::warn!("unsupported export format '{other}', defaulting to png");
                Self::Png
            },
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// Everything one render needs to know
///
/// All numeric knobs are sanitized through [`RenderConfig::sanitize`]:
/// jitter ranges never go negative, the realism dial stays in 1–5, and the
/// quality scalar stays strictly positive.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub text: String,
    pub template: Option<types::PaperTemplate>,
    pub font_family: String,
    pub font_size: f32,
    /// Baseline jitter range in pixels
    pub baseline_jitter: f32,
    /// Slant jitter range in radians
    pub slant_jitter: f32,
    /// Micro-tilt range in radians
    pub micro_tilt: f32,
    /// Color variation intensity, 0–3
    pub color_intensity: f32,
    pub ink_color: Color,
    pub blend: types::InkBlend,
    /// 1 = heaviest analog grain, 5 = cleanest
    pub realism: u8,
    pub max_pages: usize,
    pub words_per_page: usize,
    pub use_texture_cache: bool,
    /// Quality scalar applied to the surface size, > 0
    pub quality: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 1130,
            text: String::new(),
            template: None,
            font_family: String::new(),
            font_size: 24.0,
            baseline_jitter: variation::DEFAULT_BASELINE_JITTER,
            slant_jitter: variation::DEFAULT_SLANT_JITTER,
            micro_tilt: variation::DEFAULT_MICRO_TILT,
            color_intensity: 1.0,
            ink_color: Color::ink_blue(),
            blend: types::InkBlend::Multiply,
            realism: 3,
            max_pages: 10,
            words_per_page: 250,
            use_texture_cache: true,
            quality: 1.0,
        }
    }
}

impl RenderConfig {
    /// Clamp every knob back into its documented range.
    pub fn sanitize(&mut self) {
        let clamp_range = |v: f32, max: f32| {
            if v.is_finite() {
                v.clamp(0.0, max)
            } else {
                0.0
            }
        };
        self.baseline_jitter = clamp_range(self.baseline_jitter, variation::MAX_JITTER_RANGE);
        self.slant_jitter = clamp_range(self.slant_jitter, variation::MAX_JITTER_RANGE);
        self.micro_tilt = clamp_range(self.micro_tilt, variation::MAX_JITTER_RANGE);
        self.color_intensity = clamp_range(self.color_intensity, variation::MAX_COLOR_INTENSITY);
        self.realism = self.realism.clamp(1, 5);
        if !self.quality.is_finite() || self.quality <= 0.0 {
            self.quality = 1.0;
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            self.font_size = 24.0;
        }
        if self.words_per_page == 0 {
            self.words_per_page = 250;
        }
        if self.max_pages == 0 {
            self.max_pages = 1;
        }
    }

    /// A sanitized copy, for call sites that hold a shared config.
    pub fn sanitized(&self) -> Self {
        let mut copy = self.clone();
        copy.sanitize();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Color::from_hex("1A237E"), Some(Color::ink_blue()));
        assert_eq!(Color::from_hex("#000000"), Some(Color::black()));
        assert_eq!(
            Color::from_hex("FFFFFF80"),
            Some(Color::rgba(255, 255, 255, 128))
        );
        assert_eq!(Color::from_hex("xyz"), None);
        assert_eq!(Color::from_hex("12345"), None);
    }

    #[test]
    fn shifted_clamps_channels() {
        let c = Color::rgb(250, 5, 128).shifted(20, -20, 0);
        assert_eq!((c.r, c.g, c.b), (255, 0, 128));
    }

    #[test]
    fn format_normalization_defaults_to_png() {
        assert_eq!(ExportFormat::normalize("JPEG"), ExportFormat::Jpeg);
        assert_eq!(ExportFormat::normalize("webp"), ExportFormat::Webp);
        assert_eq!(ExportFormat::normalize("tiff"), ExportFormat::Png);
        assert_eq!(ExportFormat::normalize(""), ExportFormat::Png);
    }

    #[test]
    fn sanitize_restores_invariants() {
        let mut config = RenderConfig {
            baseline_jitter: -4.0,
            slant_jitter: f32::NAN,
            realism: 9,
            quality: 0.0,
            words_per_page: 0,
            ..RenderConfig::default()
        };
        config.sanitize();
        assert_eq!(config.baseline_jitter, 0.0);
        assert_eq!(config.slant_jitter, 0.0);
        assert_eq!(config.realism, 5);
        assert_eq!(config.quality, 1.0);
        assert_eq!(config.words_per_page, 250);
    }
}
