//! HTTP download stage: fetch every [`DownloadTask`] through the bounded
//! scheduler and stream each body to disk.
//!
//! A task that fails is logged and abandoned; nothing is retried and no
//! failure reaches the other tasks. Bodies are streamed into a temp file next
//! to the destination and renamed over it only after the last byte is
//! written, so an interrupted transfer never leaves a truncated PDF behind
//! for the existing-file filter to mistake for a finished one.

use crate::error::{DownloadError, HarvestError};
use crate::filter::DownloadTask;
use crate::progress::ProgressCallback;
use crate::scheduler::run_bounded;
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Aggregate outcome of a download batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Build the shared HTTP client. Every request carries `user_agent`.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, HarvestError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| HarvestError::HttpClient(e.to_string()))
}

/// Download every task with at most `concurrency` requests in flight.
///
/// Returns once all tasks have finished, successfully or not.
pub async fn download_all(
    client: &reqwest::Client,
    tasks: Vec<DownloadTask>,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> DownloadSummary {
    if let Some(ref cb) = progress {
        cb.on_downloads_start(tasks.len());
    }

    let scheduled = tasks.len();
    let client = client.clone();
    let cb = progress.clone();
    let outcomes = run_bounded(tasks, concurrency, move |task: DownloadTask| {
        let client = client.clone();
        let cb = cb.clone();
        async move {
            info!("Downloading {}", task.link);
            let result = download_one(&client, &task).await;
            match &result {
                Ok(path) => {
                    info!("Saved {}", path.display());
                    if let Some(ref cb) = cb {
                        cb.on_download_complete(task.link.as_str(), path);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    if let Some(ref cb) = cb {
                        cb.on_download_error(task.link.as_str(), &e.to_string());
                    }
                }
            }
            result.is_ok()
        }
    })
    .await;

    // A panicked task produces no outcome; it still counts as failed.
    let completed = outcomes.iter().filter(|ok| **ok).count();
    let summary = DownloadSummary {
        completed,
        failed: scheduled - completed,
    };

    info!(
        "All downloads completed: {} saved, {} failed",
        summary.completed, summary.failed
    );
    if let Some(ref cb) = progress {
        cb.on_downloads_finished(summary.completed, summary.failed);
    }
    summary
}

/// Fetch one URL and write its body to the task's destination.
pub async fn download_one(
    client: &reqwest::Client,
    task: &DownloadTask,
) -> Result<PathBuf, DownloadError> {
    let url = task.link.as_str();

    let response = client
        .get(task.link.url().clone())
        .send()
        .await
        .map_err(|source| DownloadError::Transport {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let dest = &task.destination;
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".pdfharvest-").suffix(".part");
    // Same mode as a plain create (0666 minus umask), not tempfile's 0600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let tmp = builder
        .tempfile_in(dir)
        .map_err(|source| DownloadError::CreateFile {
            path: dest.clone(),
            source,
        })?;
    // `tmp_path` deletes the partial file on drop unless persisted.
    let (std_file, tmp_path) = tmp.into_parts();
    let mut file = tokio::fs::File::from_std(std_file);

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Body {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| DownloadError::SaveFile {
                path: dest.clone(),
                source,
            })?;
    }
    file.flush().await.map_err(|source| DownloadError::SaveFile {
        path: dest.clone(),
        source,
    })?;
    drop(file);

    tmp_path
        .persist(dest)
        .map_err(|e| DownloadError::SaveFile {
            path: dest.clone(),
            source: e.error,
        })?;

    Ok(dest.clone())
}
