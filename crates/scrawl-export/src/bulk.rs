//! Multi-page delivery as one gzipped tar archive

use crate::download::DownloadManager;
use flate2::write::GzEncoder;
use flate2::Compression;
use scrawl_core::error::{ExportError, Result};
use scrawl_core::types::{DownloadResult, ExportResult};

/// Bundles a document's pages into `<stem>.tar.gz`
pub struct BulkDownloadManager {
    downloads: DownloadManager,
}

impl BulkDownloadManager {
    pub fn new(downloads: DownloadManager) -> Self {
        Self { downloads }
    }

    /// Build the archive in memory. Pages that failed to export are
    /// skipped; an archive with zero usable pages is an error.
    pub fn archive(&self, pages: &[ExportResult], stem: &str) -> Result<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut bundled = 0usize;

        for (index, page) in pages.iter().enumerate() {
            let Some(blob) = page.blob.as_ref() else {
                log::warn!("skipping failed page {} in bulk archive", index + 1);
                continue;
            };
            let name = format!(
                "{stem}/page_{:03}.{}",
                index + 1,
                page.format.extension()
            );
            let mut header = tar::Header::new_gnu();
            header.set_size(blob.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, &name, blob.as_slice())
                .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
            bundled += 1;
        }

        if bundled == 0 {
            return Err(
                ExportError::ConversionFailed("no pages to bundle".to_string()).into(),
            );
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
        let bytes = encoder
            .finish()
            .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
        log::info!("bundled {bundled} page(s) into {stem}.tar.gz ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Archive and deliver in one step.
    pub fn download_archive(&self, pages: &[ExportResult], stem: &str) -> DownloadResult {
        match self.archive(pages, stem) {
            Ok(bytes) => self.downloads.download(&format!("{stem}.tar.gz"), &bytes),
            Err(e) => DownloadResult {
                filename: format!("{stem}.tar.gz"),
                size: 0,
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::ExportFormat;
    use std::io::Read;

    fn exported(bytes: &[u8]) -> ExportResult {
        ExportResult {
            blob: Some(bytes.to_vec()),
            format: ExportFormat::Png,
            size: bytes.len(),
            width: 4,
            height: 4,
            success: true,
            error: None,
        }
    }

    fn failed() -> ExportResult {
        ExportResult {
            blob: None,
            format: ExportFormat::Png,
            size: 0,
            width: 0,
            height: 0,
            success: false,
            error: Some("encode failed".to_string()),
        }
    }

    #[test]
    fn archive_contains_one_entry_per_successful_page() {
        let dir = tempfile::tempdir().unwrap();
        let bulk = BulkDownloadManager::new(DownloadManager::new(dir.path()));
        let pages = vec![exported(b"one"), failed(), exported(b"three")];
        let bytes = bulk.archive(&pages, "letter").unwrap();

        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes.as_slice()));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            names.push(entry.path().unwrap().display().to_string());
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            assert!(!content.is_empty());
        }
        assert_eq!(names, vec!["letter/page_001.png", "letter/page_003.png"]);
    }

    #[test]
    fn all_failed_pages_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bulk = BulkDownloadManager::new(DownloadManager::new(dir.path()));
        assert!(bulk.archive(&[failed()], "doc").is_err());
    }

    #[test]
    fn download_archive_writes_the_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let bulk = BulkDownloadManager::new(DownloadManager::new(dir.path()));
        let result = bulk.download_archive(&[exported(b"page")], "journal");
        assert!(result.success);
        assert_eq!(result.filename, "journal.tar.gz");
        assert!(dir.path().join("journal.tar.gz").exists());
    }
}
