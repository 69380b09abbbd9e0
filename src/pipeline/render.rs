//! PDF rasterisation for OCR: render every page and PNG-encode it.
//!
//! ## Pixel cap
//!
//! An A0 poster at 300 DPI would be roughly 10,000 × 14,000 px.
//! `max_rendered_pixels` caps the longest edge regardless of physical size.
//!
//! Encoding happens here, on the blocking thread; only PNG bytes are held
//! for the whole document, never full bitmaps.

use crate::error::{ConvertError, PageError};
use crate::pipeline::encode::encode_png;
use crate::pipeline::reader::PageImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Rasterise every page of a PDF into PNG bytes.
///
/// Only a failure to open the document is an error; per-page render or
/// encode failures are returned in place of that page's image.
pub fn render_pages(
    pdfium: &Pdfium,
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<PageImage>, ConvertError> {
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ConvertError::OpenPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("Rasterising {} pages of {}", total_pages, pdf_path.display());

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page_num = idx + 1;
        let png = render_one(&pages, idx as u16, &render_config)
            .map_err(|detail| PageError::RenderFailed {
                page: page_num,
                detail,
            })
            .and_then(|image| {
                debug!(
                    "Rendered page {} → {}x{} px",
                    page_num,
                    image.width(),
                    image.height()
                );
                encode_png(&image).map_err(|e| PageError::EncodeFailed {
                    page: page_num,
                    detail: e.to_string(),
                })
            });

        results.push(PageImage { page_num, png });
    }

    Ok(results)
}

fn render_one(
    pages: &PdfPages<'_>,
    index: u16,
    config: &PdfRenderConfig,
) -> Result<image::DynamicImage, String> {
    let page = pages.get(index).map_err(|e| format!("{:?}", e))?;
    let bitmap = page
        .render_with_config(config)
        .map_err(|e| format!("{:?}", e))?;
    Ok(bitmap.as_image())
}
