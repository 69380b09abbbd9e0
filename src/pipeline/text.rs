//! Direct text-layer extraction via pdfium.
//!
//! Runs on a blocking thread (see [`crate::pipeline::reader`]). A page whose
//! object or text layer cannot be loaded becomes a [`PageError::Unreadable`]
//! entry; the rest of the document is still read.

use crate::error::{ConvertError, PageError};
use crate::pipeline::reader::PageText;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Read the text layer of every page, 1-indexed, in page order.
pub fn extract_page_texts(pdfium: &Pdfium, pdf_path: &Path) -> Result<Vec<PageText>, ConvertError> {
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ConvertError::OpenPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    debug!("{}: {} pages", pdf_path.display(), total_pages);

    let texts = (0..total_pages)
        .map(|idx| {
            let page_num = idx + 1;
            let text = read_page_text(&pages, idx as u16).map_err(|e| PageError::Unreadable {
                page: page_num,
                detail: format!("{:?}", e),
            });
            PageText { page_num, text }
        })
        .collect();

    Ok(texts)
}

fn read_page_text(pages: &PdfPages<'_>, index: u16) -> Result<String, PdfiumError> {
    let page = pages.get(index)?;
    let text = page.text()?.all();
    Ok(text)
}
