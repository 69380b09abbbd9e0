//! # pdfharvest
//!
//! Download every PDF linked from a local HTML page and, optionally, turn
//! each one into a plain-text file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML page
//!  │
//!  ├─ 1. Links     anchors whose href ends in ".pdf", resolved against a base URL
//!  ├─ 2. Filter    skip links whose file is already in the output directory
//!  ├─ 3. Download  concurrent GETs, at most N in flight (tokio Semaphore)
//!  └─ 4. Convert   pdfium text layer per page; image-only PDFs go through OCR
//! ```
//!
//! Runs are idempotent: a second run over the same page downloads and
//! converts nothing that is already on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfharvest::{harvest, HarvestConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::builder()
//!         .html_file("release.html")
//!         .base_url("https://www.archives.gov/research/jfk/release-2025")
//!         .concurrency(8)
//!         .convert_text(true)
//!         .build()?;
//!     let report = harvest(&config).await?;
//!     println!("{} saved, {} failed", report.downloads.completed, report.downloads.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfharvest` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfharvest = { version = "0.1", default-features = false }
//! ```
//!
//! ## Native requirements
//!
//! Text conversion needs a pdfium shared library (`PDFIUM_LIB_PATH`, the
//! working directory, or the system path) and, for the default OCR engine,
//! the `tesseract` executable. Downloading alone needs neither.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod download;
pub mod error;
pub mod filter;
pub mod harvest;
pub mod links;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scheduler;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{HarvestConfig, HarvestConfigBuilder, OcrBackend};
pub use convert::{convert_directory, convert_document, ConversionSummary, ExtractionMode};
pub use download::{download_all, DownloadSummary};
pub use error::{ConvertError, DownloadError, HarvestError, OcrError, PageError};
pub use filter::{partition_existing, DownloadTask};
pub use harvest::{harvest, HarvestReport};
pub use links::{extract_links, DocumentLink};
pub use pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
pub use pipeline::reader::{DocumentReader, PageImage, PageText, PdfiumReader};
pub use progress::{HarvestProgress, NoopProgress, ProgressCallback};
