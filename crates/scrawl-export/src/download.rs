//! Delivering encoded blobs to a directory

use scrawl_core::types::DownloadResult;
use std::path::{Path, PathBuf};

/// How downloads will be delivered, probed up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMethod {
    /// The delivery directory exists (or can be created) and is writable
    FileSystem,
    Unsupported,
}

/// Writes blobs into a delivery directory with sanitized names
pub struct DownloadManager {
    dir: PathBuf,
}

impl DownloadManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Probe the delivery directory by writing and removing a marker.
    pub fn method(&self) -> DownloadMethod {
        if std::fs::create_dir_all(&self.dir).is_err() {
            return DownloadMethod::Unsupported;
        }
        let probe = self.dir.join(".scrawl-write-probe");
        match std::fs::write(&probe, b"") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
                DownloadMethod::FileSystem
            },
            Err(_) => DownloadMethod::Unsupported,
        }
    }

    pub fn is_download_supported(&self) -> bool {
        self.method() == DownloadMethod::FileSystem
    }

    /// Write one blob. IO failures land in the result, not a panic.
    pub fn download(&self, filename: &str, blob: &[u8]) -> DownloadResult {
        let filename = sanitize_filename(filename);
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            return failure(&filename, e.to_string());
        }
        let path = self.dir.join(&filename);
        match std::fs::write(&path, blob) {
            Ok(()) => {
                log::debug!("wrote {} bytes to {}", blob.len(), path.display());
                DownloadResult {
                    filename,
                    size: blob.len(),
                    success: true,
                    error: None,
                }
            },
            Err(e) => failure(&filename, e.to_string()),
        }
    }
}

fn failure(filename: &str, error: String) -> DownloadResult {
    log::warn!("download of '{filename}' failed: {error}");
    DownloadResult {
        filename: filename.to_string(),
        size: 0,
        success: false,
        error: Some(error),
    }
}

/// Strip path separators and control characters so a filename can never
/// escape the delivery directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "page.png".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloads_land_in_the_delivery_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DownloadManager::new(dir.path().join("out"));
        assert!(manager.is_download_supported());

        let result = manager.download("page_001.png", b"fake png");
        assert!(result.success);
        assert_eq!(result.size, 8);
        assert!(dir.path().join("out/page_001.png").exists());
    }

    #[test]
    fn unwritable_target_is_reported_as_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let manager = DownloadManager::new(&blocker);
        assert_eq!(manager.method(), DownloadMethod::Unsupported);
    }

    #[test]
    fn traversal_attempts_are_neutralized() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_filename("a/b.png"), "a_b.png");
        assert_eq!(sanitize_filename(""), "page.png");
        assert_eq!(sanitize_filename("..."), "_");
    }

    #[test]
    fn failed_writes_return_an_error_result() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let manager = DownloadManager::new(&blocker);
        let result = manager.download("x.png", b"data");
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
