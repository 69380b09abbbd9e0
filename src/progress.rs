//! Progress-callback trait for download and conversion events.
//!
//! Inject an [`Arc<dyn HarvestProgress>`] via
//! [`crate::config::HarvestConfigBuilder::progress`] to receive events as the
//! run proceeds. The CLI uses it to drive an `indicatif` progress bar; tests
//! use it to count events.
//!
//! Download events fire from concurrently running tasks, so implementations
//! must synchronise any shared mutable state (`Mutex`, atomics).
//!
//! # Example
//!
//! ```rust
//! use pdfharvest::{HarvestConfig, HarvestProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl HarvestProgress for Counter {
//!     fn on_download_complete(&self, _url: &str, _path: &std::path::Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = HarvestConfig::builder()
//!     .progress(Arc::new(Counter(AtomicUsize::new(0))) as Arc<dyn HarvestProgress>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the harvest stages as they make progress.
///
/// All methods default to no-ops so implementors override only what they use.
pub trait HarvestProgress: Send + Sync {
    /// Called once before the first download is scheduled.
    fn on_downloads_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a download has been fully written to `path`.
    fn on_download_complete(&self, url: &str, path: &Path) {
        let _ = (url, path);
    }

    /// Called when a download was abandoned.
    fn on_download_error(&self, url: &str, error: &str) {
        let _ = (url, error);
    }

    /// Called once after every download task has finished.
    fn on_downloads_finished(&self, completed: usize, failed: usize) {
        let _ = (completed, failed);
    }

    /// Called once before the first document is converted.
    ///
    /// `total` counts every PDF in the directory, including ones whose text
    /// file already exists.
    fn on_conversion_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a document's text file has been written.
    fn on_document_complete(&self, name: &str, used_ocr: bool) {
        let _ = (name, used_ocr);
    }

    /// Called when a document is skipped because its text file exists.
    fn on_document_skipped(&self, name: &str) {
        let _ = name;
    }

    /// Called when a document could not be converted.
    fn on_document_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after every document has been attempted.
    fn on_conversion_finished(&self, converted: usize, failed: usize) {
        let _ = (converted, failed);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgress;

impl HarvestProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::HarvestConfig`].
pub type ProgressCallback = Arc<dyn HarvestProgress>;
