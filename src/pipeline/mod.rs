//! Pipeline stages for PDF-to-text conversion.
//!
//! Each submodule implements one step. The PDF and OCR backends sit behind
//! traits ([`reader::DocumentReader`], [`ocr::OcrEngine`]) so the per-document
//! state machine in [`crate::convert`] can run against fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ text ─────────────────────────────▶ page blocks
//! reader ────┤
//!            └─▶ render ──▶ encode ──▶ ocr ────────▶ page blocks (OCR)
//!  (pdfium)      (bitmap)    (PNG)    (tesseract / VLM)
//! ```
//!
//! 1. [`reader`]: the `DocumentReader` trait and its pdfium implementation;
//!    binding happens per call inside `spawn_blocking`
//! 2. [`text`]:   direct text-layer extraction, page by page
//! 3. [`render`]: rasterise every page for OCR
//! 4. [`encode`]: PNG-encode bitmaps (and base64-wrap them for the VLM)
//! 5. [`ocr`]:    the `OcrEngine` trait with tesseract and vision backends

pub mod encode;
pub mod ocr;
pub mod reader;
pub mod render;
pub mod text;
