//! PDF-to-text conversion: per-document state machine and batch driver.
//!
//! ## Per document
//!
//! ```text
//! DIRECT_ATTEMPTED ──(some page has text)──▶ DONE
//!        │
//!        └──(no page has text)──▶ OCR_ATTEMPTED ──▶ DONE
//! ```
//!
//! The whole text file is assembled in memory and written through a temp
//! file plus rename, so a document either gets a complete text file or none.
//!
//! ## Output format
//!
//! ```text
//! --- Page 1 ---
//! <text>
//!
//! --- Page 2 (OCR) ---
//! <text>
//!
//! ```

use crate::error::{ConvertError, HarvestError, PageError};
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::reader::{DocumentReader, PageImage, PageText};
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a document's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionMode {
    /// At least one page had a text layer.
    Direct,
    /// No page had a text layer; every page went through OCR.
    Ocr,
}

/// Result of converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub mode: ExtractionMode,
    /// Page blocks written to the text file.
    pub pages_written: usize,
    pub text_path: PathBuf,
}

/// Aggregate outcome of a conversion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub converted_direct: usize,
    pub converted_ocr: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

impl ConversionSummary {
    pub fn converted(&self) -> usize {
        self.converted_direct + self.converted_ocr
    }
}

/// Format one page block.
pub fn page_block(page_num: usize, text: &str, ocr: bool) -> String {
    if ocr {
        format!("--- Page {} (OCR) ---\n{}\n\n", page_num, text)
    } else {
        format!("--- Page {} ---\n{}\n\n", page_num, text)
    }
}

/// Text file name for a PDF file name: `x.pdf` → `x.txt`.
pub fn text_file_name(pdf_name: &str) -> String {
    format!("{}.txt", pdf_name.strip_suffix(".pdf").unwrap_or(pdf_name))
}

/// Convert one PDF to a text file, falling back to OCR for image-only documents.
pub async fn convert_document(
    reader: &Arc<dyn DocumentReader>,
    ocr: &Arc<dyn OcrEngine>,
    pdf_path: &Path,
    text_path: &Path,
) -> Result<DocumentOutcome, ConvertError> {
    // ── Direct extraction ────────────────────────────────────────────────
    let pages = read_texts(reader, pdf_path).await?;
    let (mut output, mut pages_written) = assemble_direct(&pages);

    let mode = if pages_written > 0 {
        ExtractionMode::Direct
    } else {
        // ── OCR fallback ─────────────────────────────────────────────────
        info!("No text found in PDF, attempting OCR: {}", pdf_path.display());
        let images = read_images(reader, pdf_path).await?;
        (output, pages_written) = assemble_ocr(ocr.as_ref(), images).await;
        ExtractionMode::Ocr
    };

    write_atomic(text_path, &output).await?;

    Ok(DocumentOutcome {
        mode,
        pages_written,
        text_path: text_path.to_path_buf(),
    })
}

/// Convert every `*.pdf` in `pdf_dir` whose text file does not exist yet.
///
/// Listing `pdf_dir` or creating `text_dir` failing is fatal; anything that
/// goes wrong with one document only skips that document.
pub async fn convert_directory(
    pdf_dir: &Path,
    text_dir: &Path,
    reader: &Arc<dyn DocumentReader>,
    ocr: &Arc<dyn OcrEngine>,
    progress: Option<&ProgressCallback>,
) -> Result<ConversionSummary, HarvestError> {
    let names = list_pdfs(pdf_dir).await?;

    tokio::fs::create_dir_all(text_dir)
        .await
        .map_err(|source| HarvestError::CreateDir {
            path: text_dir.to_path_buf(),
            source,
        })?;

    if let Some(cb) = progress {
        cb.on_conversion_start(names.len());
    }

    let mut summary = ConversionSummary::default();

    for name in names {
        let pdf_path = pdf_dir.join(&name);
        let text_path = text_dir.join(text_file_name(&name));

        if matches!(tokio::fs::try_exists(&text_path).await, Ok(true)) {
            debug!("{} already converted, skipping", name);
            summary.skipped_existing += 1;
            if let Some(cb) = progress {
                cb.on_document_skipped(&name);
            }
            continue;
        }

        info!("Converting {} to text...", name);
        match convert_document(reader, ocr, &pdf_path, &text_path).await {
            Ok(outcome) => {
                let used_ocr = outcome.mode == ExtractionMode::Ocr;
                if used_ocr {
                    summary.converted_ocr += 1;
                } else {
                    summary.converted_direct += 1;
                }
                info!(
                    "Wrote {} ({} pages{})",
                    outcome.text_path.display(),
                    outcome.pages_written,
                    if used_ocr { ", OCR" } else { "" }
                );
                if let Some(cb) = progress {
                    cb.on_document_complete(&name, used_ocr);
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Error converting {}: {}", name, e);
                if let Some(cb) = progress {
                    cb.on_document_error(&name, &e.to_string());
                }
            }
        }
    }

    info!(
        "Text conversion completed: {} converted ({} via OCR), {} skipped, {} failed",
        summary.converted(),
        summary.converted_ocr,
        summary.skipped_existing,
        summary.failed
    );
    if let Some(cb) = progress {
        cb.on_conversion_finished(summary.converted(), summary.failed);
    }
    Ok(summary)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn read_texts(
    reader: &Arc<dyn DocumentReader>,
    pdf_path: &Path,
) -> Result<Vec<PageText>, ConvertError> {
    let reader = Arc::clone(reader);
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || reader.page_texts(&path))
        .await
        .map_err(|e| ConvertError::Internal(format!("Text extraction task panicked: {}", e)))?
}

async fn read_images(
    reader: &Arc<dyn DocumentReader>,
    pdf_path: &Path,
) -> Result<Vec<PageImage>, ConvertError> {
    let reader = Arc::clone(reader);
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || reader.page_images(&path))
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocks for every page with non-whitespace text; returns the count too.
fn assemble_direct(pages: &[PageText]) -> (String, usize) {
    let mut output = String::new();
    let mut written = 0;

    for page in pages {
        match &page.text {
            Ok(text) if !text.trim().is_empty() => {
                output.push_str(&page_block(page.page_num, text, false));
                written += 1;
            }
            Ok(_) => debug!("Page {}: no text layer", page.page_num),
            Err(e) => warn!("{}", e),
        }
    }

    (output, written)
}

/// OCR every rendered page in order. Failed pages contribute nothing.
async fn assemble_ocr(ocr: &dyn OcrEngine, images: Vec<PageImage>) -> (String, usize) {
    let mut output = String::new();
    let mut written = 0;

    for image in images {
        let png = match image.png {
            Ok(png) => png,
            Err(e) => {
                warn!("Error getting page image {}: {}", image.page_num, e);
                continue;
            }
        };

        match ocr.recognize(&png).await {
            Ok(text) => {
                output.push_str(&page_block(image.page_num, &text, true));
                written += 1;
            }
            Err(e) => {
                let e = PageError::OcrFailed {
                    page: image.page_num,
                    detail: e.to_string(),
                };
                warn!("Error performing OCR ({}): {}", ocr.name(), e);
            }
        }
    }

    (output, written)
}

async fn list_pdfs(pdf_dir: &Path) -> Result<Vec<String>, HarvestError> {
    let read_dir_err = |source| HarvestError::ReadDir {
        path: pdf_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(pdf_dir).await.map_err(read_dir_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".pdf") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Write via temp file + rename so readers never see a half-written file.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), ConvertError> {
    let write_err = |source| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned page texts/images keyed by file name.
    #[derive(Default)]
    struct FakeReader {
        texts: HashMap<String, Vec<Result<String, PageError>>>,
        images: HashMap<String, Vec<Result<Vec<u8>, PageError>>>,
        image_calls: AtomicUsize,
    }

    impl FakeReader {
        fn key(path: &Path) -> String {
            path.file_name().unwrap().to_string_lossy().into_owned()
        }
    }

    impl DocumentReader for FakeReader {
        fn page_texts(&self, pdf_path: &Path) -> Result<Vec<PageText>, ConvertError> {
            let pages = self.texts.get(&Self::key(pdf_path)).ok_or_else(|| {
                ConvertError::OpenPdf {
                    path: pdf_path.to_path_buf(),
                    detail: "not a PDF".into(),
                }
            })?;
            Ok(pages
                .iter()
                .enumerate()
                .map(|(i, t)| PageText {
                    page_num: i + 1,
                    text: t.clone(),
                })
                .collect())
        }

        fn page_images(&self, pdf_path: &Path) -> Result<Vec<PageImage>, ConvertError> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            let pages = self.images.get(&Self::key(pdf_path)).cloned().unwrap_or_default();
            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(i, png)| PageImage {
                    page_num: i + 1,
                    png,
                })
                .collect())
        }
    }

    /// Echoes the image bytes back as text; fails on "bad".
    struct EchoOcr;

    #[async_trait]
    impl OcrEngine for EchoOcr {
        fn name(&self) -> &str {
            "echo"
        }

        async fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
            if png == b"bad" {
                return Err(OcrError::Vision("unreadable".into()));
            }
            Ok(String::from_utf8_lossy(png).into_owned())
        }
    }

    fn ocr() -> Arc<dyn OcrEngine> {
        Arc::new(EchoOcr)
    }

    #[test]
    fn page_block_format() {
        assert_eq!(page_block(1, "hello", false), "--- Page 1 ---\nhello\n\n");
        assert_eq!(page_block(3, "scan", true), "--- Page 3 (OCR) ---\nscan\n\n");
    }

    #[test]
    fn text_file_name_replaces_pdf_suffix() {
        assert_eq!(text_file_name("doc1.pdf"), "doc1.txt");
        assert_eq!(text_file_name("a.b.pdf"), "a.b.txt");
    }

    #[tokio::test]
    async fn text_layer_is_used_and_ocr_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut fake = FakeReader::default();
        fake.texts.insert(
            "a.pdf".into(),
            vec![
                Ok("first page".into()),
                Ok("   \n\t".into()),
                Err(PageError::Unreadable {
                    page: 3,
                    detail: "null page".into(),
                }),
                Ok("fourth".into()),
            ],
        );
        let fake = Arc::new(fake);
        let reader: Arc<dyn DocumentReader> = fake.clone();

        let text_path = dir.path().join("a.txt");
        let outcome = convert_document(&reader, &ocr(), Path::new("a.pdf"), &text_path)
            .await
            .unwrap();

        assert_eq!(outcome.mode, ExtractionMode::Direct);
        assert_eq!(outcome.pages_written, 2);
        assert_eq!(fake.image_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            std::fs::read_to_string(&text_path).unwrap(),
            "--- Page 1 ---\nfirst page\n\n--- Page 4 ---\nfourth\n\n"
        );
    }

    #[tokio::test]
    async fn whitespace_only_document_falls_back_to_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let mut fake = FakeReader::default();
        fake.texts
            .insert("scan.pdf".into(), vec![Ok(" ".into()), Ok(String::new()), Ok("\n".into())]);
        fake.images.insert(
            "scan.pdf".into(),
            vec![
                Ok(b"PAGE ONE".to_vec()),
                Ok(b"bad".to_vec()),
                Err(PageError::RenderFailed {
                    page: 3,
                    detail: "oom".into(),
                }),
            ],
        );
        let reader: Arc<dyn DocumentReader> = Arc::new(fake);

        let text_path = dir.path().join("scan.txt");
        let outcome = convert_document(&reader, &ocr(), Path::new("scan.pdf"), &text_path)
            .await
            .unwrap();

        assert_eq!(outcome.mode, ExtractionMode::Ocr);
        assert_eq!(outcome.pages_written, 1);
        assert_eq!(
            std::fs::read_to_string(&text_path).unwrap(),
            "--- Page 1 (OCR) ---\nPAGE ONE\n\n"
        );
    }

    #[tokio::test]
    async fn unopenable_pdf_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reader: Arc<dyn DocumentReader> = Arc::new(FakeReader::default());
        let text_path = dir.path().join("broken.txt");

        let err = convert_document(&reader, &ocr(), Path::new("broken.pdf"), &text_path)
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::OpenPdf { .. }));
        assert!(!text_path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unwritable_output_is_a_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut fake = FakeReader::default();
        fake.texts.insert("a.pdf".into(), vec![Ok("x".into())]);
        let reader: Arc<dyn DocumentReader> = Arc::new(fake);

        let text_path = dir.path().join("no-such-dir").join("a.txt");
        let err = convert_document(&reader, &ocr(), Path::new("a.pdf"), &text_path)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn directory_batch_skips_existing_and_isolates_failures() {
        let pdf_dir = tempfile::tempdir().unwrap();
        let text_dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "b.pdf", "broken.pdf", "done.pdf", "notes.html"] {
            std::fs::write(pdf_dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::write(text_dir.path().join("done.txt"), "old").unwrap();

        let mut fake = FakeReader::default();
        fake.texts.insert("a.pdf".into(), vec![Ok("alpha".into())]);
        fake.texts.insert("b.pdf".into(), vec![Ok("".into())]);
        fake.images.insert("b.pdf".into(), vec![Ok(b"beta".to_vec())]);
        fake.texts.insert("done.pdf".into(), vec![Ok("new".into())]);
        let reader: Arc<dyn DocumentReader> = Arc::new(fake);

        let summary = convert_directory(pdf_dir.path(), text_dir.path(), &reader, &ocr(), None)
            .await
            .unwrap();

        assert_eq!(
            summary,
            ConversionSummary {
                converted_direct: 1,
                converted_ocr: 1,
                skipped_existing: 1,
                failed: 1,
            }
        );
        assert_eq!(
            std::fs::read_to_string(text_dir.path().join("done.txt")).unwrap(),
            "old"
        );
        assert!(!text_dir.path().join("broken.txt").exists());
        assert!(!text_dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn missing_pdf_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let reader: Arc<dyn DocumentReader> = Arc::new(FakeReader::default());
        let err = convert_directory(
            &dir.path().join("absent"),
            &dir.path().join("text"),
            &reader,
            &ocr(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HarvestError::ReadDir { .. }));
    }
}
