//! The single entry point that runs every stage in order.
//!
//! ```text
//! HTML file
//!  │
//!  ├─ 1. Links     parse anchors, resolve against the base URL
//!  ├─ 2. Filter    drop links whose PDF is already on disk
//!  ├─ 3. Download  bounded concurrent fetch (semaphore, JoinSet barrier)
//!  └─ 4. Convert   optional: text layer, OCR fallback, one file per PDF
//! ```

use crate::config::{HarvestConfig, OcrBackend};
use crate::convert::{convert_directory, ConversionSummary};
use crate::download::{build_client, download_all, DownloadSummary};
use crate::error::HarvestError;
use crate::filter::partition_existing;
use crate::links::extract_links;
use crate::pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
use crate::pipeline::reader::{DocumentReader, PdfiumReader};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// Matching links in the HTML, duplicates included.
    pub links_found: usize,
    /// Links whose PDF was already present.
    pub skipped_existing: usize,
    pub downloads: DownloadSummary,
    /// `None` when conversion was not requested.
    pub conversion: Option<ConversionSummary>,
}

/// Run the whole harvest described by `config`.
///
/// Returns `Err` only for setup failures. Individual downloads and
/// conversions that fail are logged and counted in the report.
pub async fn harvest(config: &HarvestConfig) -> Result<HarvestReport, HarvestError> {
    // ── Links ────────────────────────────────────────────────────────────
    let bytes = tokio::fs::read(&config.html_file)
        .await
        .map_err(|source| HarvestError::HtmlRead {
            path: config.html_file.clone(),
            source,
        })?;
    let html = String::from_utf8_lossy(&bytes);

    let base = Url::parse(&config.base_url).map_err(|source| HarvestError::InvalidBaseUrl {
        url: config.base_url.clone(),
        source,
    })?;

    let links = extract_links(&html, &base, &config.extension);
    info!("Found {} PDF links", links.len());
    let links_found = links.len();

    // ── Filter ───────────────────────────────────────────────────────────
    tokio::fs::create_dir_all(&config.pdf_dir)
        .await
        .map_err(|source| HarvestError::CreateDir {
            path: config.pdf_dir.clone(),
            source,
        })?;

    let filtered = partition_existing(links, &config.pdf_dir);

    // Conversion backends are resolved before any network traffic so a
    // missing pdfium or OCR provider fails the run up front.
    let backends = if config.convert_text {
        Some((resolve_reader(config)?, resolve_ocr(config)?))
    } else {
        None
    };

    // ── Download ─────────────────────────────────────────────────────────
    info!("Downloading {} new PDFs", filtered.to_fetch.len());
    let client = build_client(&config.user_agent)?;
    let downloads = download_all(
        &client,
        filtered.to_fetch,
        config.concurrency,
        config.progress.clone(),
    )
    .await;

    // ── Convert ──────────────────────────────────────────────────────────
    let conversion = match backends {
        Some((reader, ocr)) => {
            info!("Converting PDFs to text...");
            let summary = convert_directory(
                &config.pdf_dir,
                &config.text_dir,
                &reader,
                &ocr,
                config.progress.as_ref(),
            )
            .await?;
            Some(summary)
        }
        None => None,
    };

    info!("All operations completed.");

    Ok(HarvestReport {
        links_found,
        skipped_existing: filtered.skipped.len(),
        downloads,
        conversion,
    })
}

fn resolve_reader(config: &HarvestConfig) -> Result<Arc<dyn DocumentReader>, HarvestError> {
    if let Some(ref reader) = config.reader {
        return Ok(Arc::clone(reader));
    }
    let reader = PdfiumReader::new(config.dpi, config.max_rendered_pixels)?;
    Ok(Arc::new(reader))
}

fn resolve_ocr(config: &HarvestConfig) -> Result<Arc<dyn OcrEngine>, HarvestError> {
    if let Some(ref engine) = config.ocr_engine {
        return Ok(Arc::clone(engine));
    }
    match config.ocr {
        OcrBackend::Tesseract => {
            debug!("OCR engine: {}", config.tesseract_cmd);
            Ok(Arc::new(TesseractOcr::new(
                config.tesseract_cmd.clone(),
                config.ocr_language.clone(),
            )))
        }
        OcrBackend::Vision => {
            let ocr = VisionOcr::from_settings(
                config.provider_name.as_deref(),
                config.model.as_deref(),
            )?;
            Ok(Arc::new(ocr))
        }
    }
}
