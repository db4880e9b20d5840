//! The names most callers want in scope

pub use crate::{RenderedDocument, Scrawl, ScrawlBuilder};
pub use scrawl_core::quality::{DeviceProfile, PerformanceReport, QualityPreset};
pub use scrawl_core::recovery::RetryPolicy;
pub use scrawl_core::types::{BitmapData, InkBlend, PaperKind, PaperTemplate};
pub use scrawl_core::{Color, ExportFormat, RenderConfig, StrategyKind};
pub use scrawl_export::{DownloadManager, PageExporter};
pub use scrawl_fonts::{FontRegistry, LoadedFace};
