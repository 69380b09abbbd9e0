//! Error types for the pdfharvest library.
//!
//! Failures are scoped as narrowly as possible, and each scope has its own
//! type:
//!
//! * [`HarvestError`]: **fatal**, the run cannot proceed at all (input HTML
//!   unreadable, bad base URL, output directory cannot be created). Returned
//!   as `Err(HarvestError)` from [`crate::harvest::harvest`].
//!
//! * [`DownloadError`]: one download failed. Logged by the scheduler; the
//!   other downloads carry on.
//!
//! * [`ConvertError`]: one document could not be converted to text. Logged
//!   by the batch converter; the other documents carry on.
//!
//! * [`PageError`]: one page of one document produced no text. Logged; the
//!   rest of the document is still written.
//!
//! Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort the whole run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The input HTML file could not be read.
    #[error("Error opening file '{path}': {source}")]
    HtmlRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The base URL for relative-link resolution does not parse.
    #[error("Error parsing base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// An output directory could not be created.
    #[error("Error creating output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF directory could not be listed for conversion.
    #[error("Error reading output directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shared HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text conversion needs a pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    /// The configured OCR engine could not be set up.
    #[error("OCR engine '{engine}' is not available.\n{hint}")]
    OcrUnavailable { engine: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A single download that was abandoned.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request could not be sent or no response arrived.
    #[error("Error downloading {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Error: received status code {status} for {url}")]
    Status { url: String, status: u16 },

    /// The response body broke off mid-transfer.
    #[error("Error reading body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The destination (or its temp file) could not be created.
    #[error("Error creating file '{path}': {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the destination failed.
    #[error("Error saving file '{path}': {source}")]
    SaveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single document that could not be converted to text.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The PDF structure could not be opened.
    #[error("Error opening PDF '{path}': {detail}")]
    OpenPdf { path: PathBuf, detail: String },

    /// The text file could not be written.
    #[error("Error writing text file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pdfium could not be bound inside the worker thread.
    #[error("Failed to bind to pdfium library: {0}")]
    PdfiumBindingFailed(String),

    /// A blocking worker panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An OCR engine failed to recognise one image.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR executable could not be started.
    #[error("failed to run '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    /// The OCR executable ran but reported failure.
    #[error("'{cmd}' exited with {status}: {stderr}")]
    Failed {
        cmd: String,
        status: String,
        stderr: String,
    },

    /// Feeding the image to the OCR executable failed.
    #[error("failed to send image to '{cmd}': {source}")]
    Input {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    /// The vision model call failed.
    #[error("vision model error: {0}")]
    Vision(String),
}

/// A non-fatal error for a single page. The page contributes no text.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page object is missing or its text layer cannot be read.
    #[error("Page {page}: unreadable: {detail}")]
    Unreadable { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be encoded as PNG.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The OCR engine failed on this page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::Unreadable { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::OcrFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_names_url_and_code() {
        let e = DownloadError::Status {
            url: "https://example.org/a.pdf".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("https://example.org/a.pdf"), "got: {msg}");
    }

    #[test]
    fn open_pdf_display_names_path() {
        let e = ConvertError::OpenPdf {
            path: PathBuf::from("pdfs/x.pdf"),
            detail: "bad xref".into(),
        };
        assert!(e.to_string().contains("pdfs/x.pdf"));
        assert!(e.to_string().contains("bad xref"));
    }

    #[test]
    fn page_error_reports_page_number() {
        let e = PageError::OcrFailed {
            page: 7,
            detail: "exit status 1".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().starts_with("Page 7"));
    }

    #[test]
    fn invalid_base_url_display() {
        let source = url::Url::parse("not a url").unwrap_err();
        let e = HarvestError::InvalidBaseUrl {
            url: "not a url".into(),
            source,
        };
        assert!(e.to_string().contains("not a url"));
    }
}
