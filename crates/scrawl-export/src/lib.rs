//! Encoding rendered pages and getting them to the user
//!
//! [`PageExporter`] turns raw RGBA pages into PNG, JPEG, or WebP blobs.
//! [`DownloadManager`] writes blobs to a delivery directory, and
//! [`BulkDownloadManager`] bundles a whole document into one gzipped tar
//! archive. Export never panics on bad input; per-page failures land in
//! the result's `error` field so a batch always finishes.

pub mod bulk;
pub mod download;
pub mod exporter;

pub use bulk::BulkDownloadManager;
pub use download::{DownloadManager, DownloadMethod};
pub use exporter::PageExporter;
