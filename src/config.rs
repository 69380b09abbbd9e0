//! Configuration for a harvest run.
//!
//! Every knob lives in [`HarvestConfig`], built once via
//! [`HarvestConfigBuilder`] and passed by reference into each stage. Nothing
//! is read from global state after startup.

use crate::error::HarvestError;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::reader::DocumentReader;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default input HTML file.
pub const DEFAULT_HTML_FILE: &str = "jfk-release-2025.html";
/// Default base URL for resolving relative links.
pub const DEFAULT_BASE_URL: &str = "https://www.archives.gov/research/jfk/release-2025";
/// Default PDF output directory.
pub const DEFAULT_PDF_DIR: &str = "pdfs";
/// Default text output directory.
pub const DEFAULT_TEXT_DIR: &str = "text";
/// Default number of concurrent downloads.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Default HTTP User-Agent.
pub const DEFAULT_USER_AGENT: &str = "JFK-Files-Downloader/1.0";
/// Default link extension.
pub const DEFAULT_EXTENSION: &str = ".pdf";

/// Configuration for one harvest run.
///
/// # Example
/// ```rust
/// use pdfharvest::HarvestConfig;
///
/// let config = HarvestConfig::builder()
///     .html_file("index.html")
///     .base_url("https://example.org/reports/")
///     .concurrency(2)
///     .convert_text(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 2);
/// ```
#[derive(Clone)]
pub struct HarvestConfig {
    /// Local HTML page to scan for links.
    pub html_file: PathBuf,

    /// Base URL that relative hrefs are resolved against.
    pub base_url: String,

    /// Where downloaded PDFs are written.
    pub pdf_dir: PathBuf,

    /// Where converted text files are written.
    pub text_dir: PathBuf,

    /// Maximum simultaneous downloads. Default: 5.
    pub concurrency: usize,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Run the text-conversion stage after downloading. Default: false.
    pub convert_text: bool,

    /// Only hrefs ending with this suffix are collected. Default: ".pdf".
    pub extension: String,

    /// OCR backend used when a document has no text layer.
    pub ocr: OcrBackend,

    /// OCR language override (tesseract `-l`). `None` keeps the engine default.
    pub ocr_language: Option<String>,

    /// Tesseract executable name or path. Default: "tesseract".
    pub tesseract_cmd: String,

    /// Rasterisation DPI for OCR. Range: 72–600. Default: 300.
    ///
    /// Tesseract is tuned for roughly 300 DPI input; lower values lose small
    /// print, higher values mostly cost time.
    pub dpi: u32,

    /// Longest edge of a rendered page in pixels. Default: 4000.
    ///
    /// Caps memory for oversized pages regardless of DPI.
    pub max_rendered_pixels: u32,

    /// Vision OCR model, e.g. "gpt-4.1-nano". Provider default if `None`.
    pub model: Option<String>,

    /// Vision OCR provider name, e.g. "openai". Auto-detected if `None`.
    pub provider_name: Option<String>,

    /// Pre-constructed PDF backend. Takes precedence over pdfium.
    pub reader: Option<Arc<dyn DocumentReader>>,

    /// Pre-constructed OCR engine. Takes precedence over `ocr`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Optional progress events.
    pub progress: Option<ProgressCallback>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            html_file: PathBuf::from(DEFAULT_HTML_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            pdf_dir: PathBuf::from(DEFAULT_PDF_DIR),
            text_dir: PathBuf::from(DEFAULT_TEXT_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            convert_text: false,
            extension: DEFAULT_EXTENSION.to_string(),
            ocr: OcrBackend::default(),
            ocr_language: None,
            tesseract_cmd: "tesseract".to_string(),
            dpi: 300,
            max_rendered_pixels: 4000,
            model: None,
            provider_name: None,
            reader: None,
            ocr_engine: None,
            progress: None,
        }
    }
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("html_file", &self.html_file)
            .field("base_url", &self.base_url)
            .field("pdf_dir", &self.pdf_dir)
            .field("text_dir", &self.text_dir)
            .field("concurrency", &self.concurrency)
            .field("user_agent", &self.user_agent)
            .field("convert_text", &self.convert_text)
            .field("extension", &self.extension)
            .field("ocr", &self.ocr)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("reader", &self.reader.as_ref().map(|_| "<dyn DocumentReader>"))
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("progress", &self.progress.as_ref().map(|_| "<dyn HarvestProgress>"))
            .finish()
    }
}

impl HarvestConfig {
    /// Create a new builder for `HarvestConfig`.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`HarvestConfig`].
#[derive(Debug)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    pub fn html_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.html_file = path.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn pdf_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdf_dir = dir.into();
        self
    }

    pub fn text_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.text_dir = dir.into();
        self
    }

    /// Zero is rejected by [`build`](Self::build).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn convert_text(mut self, v: bool) -> Self {
        self.config.convert_text = v;
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.extension = ext.into();
        self
    }

    pub fn ocr(mut self, backend: OcrBackend) -> Self {
        self.config.ocr = backend;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = Some(lang.into());
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.config.reader = Some(reader);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn progress(mut self, progress: ProgressCallback) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<HarvestConfig, HarvestError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(HarvestError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(HarvestError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.extension.is_empty() {
            return Err(HarvestError::InvalidConfig(
                "Link extension must not be empty".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(HarvestError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        if let Err(source) = url::Url::parse(&c.base_url) {
            return Err(HarvestError::InvalidBaseUrl {
                url: c.base_url.clone(),
                source,
            });
        }
        Ok(self.config)
    }
}

/// Which OCR backend handles image-only documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// The `tesseract` executable. (default)
    #[default]
    Tesseract,
    /// A vision LLM via `edgequake-llm`.
    Vision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_contract() {
        let c = HarvestConfig::default();
        assert_eq!(c.html_file, PathBuf::from("jfk-release-2025.html"));
        assert_eq!(c.pdf_dir, PathBuf::from("pdfs"));
        assert_eq!(c.text_dir, PathBuf::from("text"));
        assert_eq!(c.concurrency, 5);
        assert_eq!(c.extension, ".pdf");
        assert!(!c.convert_text);
        assert_eq!(c.ocr, OcrBackend::Tesseract);
        assert!(c.ocr_language.is_none());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = HarvestConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, HarvestError::InvalidConfig(_)));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = HarvestConfig::builder()
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, HarvestError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn dpi_is_clamped() {
        let c = HarvestConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(c.dpi, 600);
        let c = HarvestConfig::builder().dpi(1).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn empty_extension_is_rejected() {
        assert!(HarvestConfig::builder().extension("").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = HarvestConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("HarvestConfig"));
        assert!(s.contains("concurrency"));
    }
}
