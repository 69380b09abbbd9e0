//! The PDF backend seam.
//!
//! [`DocumentReader`] is synchronous: implementations may block, and callers
//! run them under `tokio::task::spawn_blocking`. The pdfium implementation
//! binds the library inside each call because pdfium keeps thread-local
//! state and the blocking pool may hand the work to any thread.

use crate::error::{ConvertError, HarvestError, PageError};
use crate::pipeline::{render, text};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Text layer of one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-indexed.
    pub page_num: usize,
    pub text: Result<String, PageError>,
}

/// Rasterised, PNG-encoded image of one page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed.
    pub page_num: usize,
    pub png: Result<Vec<u8>, PageError>,
}

/// Opens PDFs for direct text extraction and for rasterisation.
///
/// Both methods return one entry per page, in page order. `Err` means the
/// document itself could not be opened.
pub trait DocumentReader: Send + Sync {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<PageText>, ConvertError>;

    fn page_images(&self, pdf_path: &Path) -> Result<Vec<PageImage>, ConvertError>;
}

/// [`DocumentReader`] backed by the pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumReader {
    dpi: u32,
    max_rendered_pixels: u32,
}

impl PdfiumReader {
    /// Verify that pdfium can be bound, then return a reader.
    ///
    /// Binding is probed once here so a missing library is reported as a
    /// setup error instead of once per document.
    pub fn new(dpi: u32, max_rendered_pixels: u32) -> Result<Self, HarvestError> {
        bind_pdfium().map_err(HarvestError::PdfiumBindingFailed)?;
        Ok(Self {
            dpi,
            max_rendered_pixels,
        })
    }
}

impl DocumentReader for PdfiumReader {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<PageText>, ConvertError> {
        let pdfium = bind_pdfium().map_err(ConvertError::PdfiumBindingFailed)?;
        text::extract_page_texts(&pdfium, pdf_path)
    }

    fn page_images(&self, pdf_path: &Path) -> Result<Vec<PageImage>, ConvertError> {
        let pdfium = bind_pdfium().map_err(ConvertError::PdfiumBindingFailed)?;
        render::render_pages(&pdfium, pdf_path, self.dpi, self.max_rendered_pixels)
    }
}

/// Bind pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, String> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            return Pdfium::bind_to_library(&path)
                .map(Pdfium::new)
                .map_err(|e| format!("'{}': {:?}", path, e));
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| format!("{:?}", e))
}
