//! Existing-file filter: drop links whose destination file is already on disk.
//!
//! This is the only duplicate check in the pipeline. Download tasks never
//! re-check the destination, so the decision is made once, before anything
//! is scheduled.

use crate::links::DocumentLink;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A link paired with the file it will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub link: DocumentLink,
    pub destination: PathBuf,
}

impl DownloadTask {
    /// Destination is `out_dir` joined with the link's final path segment.
    pub fn new(link: DocumentLink, out_dir: &Path) -> Self {
        let destination = out_dir.join(link.file_name());
        Self { link, destination }
    }
}

/// Result of [`partition_existing`].
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Destination absent: schedule these.
    pub to_fetch: Vec<DownloadTask>,
    /// Destination present (or its presence could not be determined).
    pub skipped: Vec<DownloadTask>,
    /// URL has no final path segment to name the file after.
    pub unnamed: Vec<DocumentLink>,
}

/// Split `links` into tasks to fetch and tasks whose file already exists.
///
/// Only a definite "not found" schedules a download; a failed existence
/// check counts as present.
pub fn partition_existing(links: Vec<DocumentLink>, out_dir: &Path) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for link in links {
        if link.file_name().is_empty() {
            warn!("No file name in {}, skipping download", link);
            outcome.unnamed.push(link);
            continue;
        }
        let task = DownloadTask::new(link, out_dir);
        match task.destination.try_exists() {
            Ok(false) => outcome.to_fetch.push(task),
            Ok(true) => {
                info!(
                    "File {} already exists, skipping download",
                    task.destination.display()
                );
                outcome.skipped.push(task);
            }
            Err(e) => {
                warn!(
                    "Cannot check {}: {}; skipping download",
                    task.destination.display(),
                    e
                );
                outcome.skipped.push(task);
            }
        }
    }

    outcome
}
