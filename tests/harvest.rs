//! End-to-end runs of `harvest` against a local HTTP server.
//!
//! The PDF backend and OCR engine are fakes so these tests need neither
//! pdfium nor tesseract. The fake reader inspects the downloaded bytes, so a
//! conversion only succeeds if the download really landed on disk.

use async_trait::async_trait;
use pdfharvest::{
    harvest, ConvertError, DocumentReader, HarvestConfig, HarvestError, HarvestProgress,
    OcrEngine, OcrError, PageImage, PageText,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A body starting with `TEXT:` has one page with that text layer;
/// anything else is a single image-only page whose "pixels" are the body.
#[derive(Default)]
struct BodyReader {
    text_calls: AtomicUsize,
}

impl DocumentReader for BodyReader {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<PageText>, ConvertError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        let body = std::fs::read_to_string(pdf_path).map_err(|e| ConvertError::OpenPdf {
            path: pdf_path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let text = body.strip_prefix("TEXT:").unwrap_or("").to_string();
        Ok(vec![PageText { page_num: 1, text: Ok(text) }])
    }

    fn page_images(&self, pdf_path: &Path) -> Result<Vec<PageImage>, ConvertError> {
        let png = std::fs::read(pdf_path).map_err(|e| ConvertError::OpenPdf {
            path: pdf_path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Ok(vec![PageImage { page_num: 1, png: Ok(png) }])
    }
}

struct UpperOcr;

#[async_trait]
impl OcrEngine for UpperOcr {
    fn name(&self) -> &str {
        "upper"
    }

    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        Ok(String::from_utf8_lossy(png).to_uppercase())
    }
}

#[derive(Default)]
struct Events {
    downloaded: AtomicUsize,
    download_errors: AtomicUsize,
    converted: AtomicUsize,
    ocr: AtomicUsize,
}

impl HarvestProgress for Events {
    fn on_download_complete(&self, _url: &str, _path: &Path) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_download_error(&self, _url: &str, _error: &str) {
        self.download_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_document_complete(&self, _name: &str, used_ocr: bool) {
        self.converted.fetch_add(1, Ordering::SeqCst);
        if used_ocr {
            self.ocr.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
    reader: Arc<BodyReader>,
    events: Arc<Events>,
}

impl Fixture {
    fn new(html: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join("index.html"), html).unwrap();
        Self {
            _dir: dir,
            root,
            reader: Arc::new(BodyReader::default()),
            events: Arc::new(Events::default()),
        }
    }

    fn config(&self, base: &str) -> HarvestConfig {
        HarvestConfig::builder()
            .html_file(self.root.join("index.html"))
            .base_url(base)
            .pdf_dir(self.root.join("pdfs"))
            .text_dir(self.root.join("text"))
            .concurrency(2)
            .user_agent("pdfharvest-test/1.0")
            .convert_text(true)
            .reader(self.reader.clone() as Arc<dyn DocumentReader>)
            .ocr_engine(Arc::new(UpperOcr) as Arc<dyn OcrEngine>)
            .progress(self.events.clone() as Arc<dyn HarvestProgress>)
            .build()
            .unwrap()
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).unwrap()
    }
}

fn pdf(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/pdf")
        .set_body_bytes(body.as_bytes().to_vec())
}

#[tokio::test]
async fn relative_and_absolute_links_are_downloaded_and_converted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/release/doc1.pdf"))
        .and(header("user-agent", "pdfharvest-test/1.0"))
        .respond_with(pdf("TEXT:memo of 1963"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/doc2.pdf"))
        .respond_with(pdf("scanned cable"))
        .expect(1)
        .mount(&server)
        .await;

    let fx = Fixture::new(&format!(
        r#"<html><body>
            <a href="doc1.pdf">Doc 1</a>
            <a href="{}/files/doc2.pdf">Doc 2</a>
            <a href="index.html">Home</a>
        </body></html>"#,
        server.uri()
    ));

    let report = harvest(&fx.config(&format!("{}/release/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.links_found, 2);
    assert_eq!(report.skipped_existing, 0);
    assert_eq!(report.downloads.completed, 2);
    assert_eq!(report.downloads.failed, 0);

    assert_eq!(fx.read("pdfs/doc1.pdf"), "TEXT:memo of 1963");
    assert_eq!(fx.read("pdfs/doc2.pdf"), "scanned cable");
    assert_eq!(fx.read("text/doc1.txt"), "--- Page 1 ---\nmemo of 1963\n\n");
    assert_eq!(
        fx.read("text/doc2.txt"),
        "--- Page 1 (OCR) ---\nSCANNED CABLE\n\n"
    );

    let conv = report.conversion.unwrap();
    assert_eq!(conv.converted_direct, 1);
    assert_eq!(conv.converted_ocr, 1);
    assert_eq!(fx.events.downloaded.load(Ordering::SeqCst), 2);
    assert_eq!(fx.events.converted.load(Ordering::SeqCst), 2);
    assert_eq!(fx.events.ocr.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_run_downloads_and_converts_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(pdf("TEXT:alpha"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.pdf"))
        .respond_with(pdf("bravo"))
        .expect(1)
        .mount(&server)
        .await;

    let fx = Fixture::new(r#"<a href="a.pdf">a</a><a href="b.pdf">b</a><a href="a.pdf">again</a>"#);
    let config = fx.config(&format!("{}/", server.uri()));

    // Duplicate anchors are not collapsed: both copies of a.pdf are fetched
    // on the first run.
    let first = harvest(&config).await.unwrap();
    assert_eq!(first.links_found, 3);
    assert_eq!(first.downloads.completed, 3);
    let text_calls = fx.reader.text_calls.load(Ordering::SeqCst);
    assert_eq!(text_calls, 2);

    let second = harvest(&config).await.unwrap();
    assert_eq!(second.skipped_existing, 3);
    assert_eq!(second.downloads.completed, 0);
    assert_eq!(second.downloads.failed, 0);
    let conv = second.conversion.unwrap();
    assert_eq!(conv.converted(), 0);
    assert_eq!(conv.skipped_existing, 2);
    assert_eq!(fx.reader.text_calls.load(Ordering::SeqCst), text_calls);
}

#[tokio::test]
async fn failed_download_does_not_stop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok.pdf"))
        .respond_with(pdf("TEXT:fine"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fx = Fixture::new(r#"<a href="gone.pdf">x</a><a href="ok.pdf">y</a>"#);
    let report = harvest(&fx.config(&format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.downloads.completed, 1);
    assert_eq!(report.downloads.failed, 1);
    assert_eq!(fx.events.download_errors.load(Ordering::SeqCst), 1);
    assert!(!fx.root.join("pdfs/gone.pdf").exists());
    assert!(!fx.root.join("text/gone.txt").exists());
    assert_eq!(fx.read("text/ok.txt"), "--- Page 1 ---\nfine\n\n");
}

#[tokio::test]
async fn missing_html_aborts_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(pdf("never"))
        .expect(0)
        .mount(&server)
        .await;

    let fx = Fixture::new("");
    std::fs::remove_file(fx.root.join("index.html")).unwrap();

    let err = harvest(&fx.config(&server.uri())).await.unwrap_err();
    assert!(matches!(err, HarvestError::HtmlRead { .. }));
    assert!(!fx.root.join("pdfs").exists());
}
