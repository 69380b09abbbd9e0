//! CLI binary for pdfharvest.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `HarvestConfig`, installs logging and renders progress.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfharvest::config::{
    DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_EXTENSION, DEFAULT_HTML_FILE, DEFAULT_PDF_DIR,
    DEFAULT_TEXT_DIR, DEFAULT_USER_AGENT,
};
use pdfharvest::{harvest, HarvestConfig, HarvestProgress, HarvestReport, OcrBackend, ProgressCallback};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar reused for the download phase and then the
/// conversion phase. Download events arrive out of order from concurrent
/// tasks; the bar only counts them.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Reading HTML…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the counted style for a phase of `total` items.
    fn start_phase(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.set_message("");
    }

    fn fail_line(&self, what: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), what, red(&msg)));
        self.bar.inc(1);
    }

    fn finish_phase(&self, done: usize, failed: usize, noun: &str) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!("{} {} {noun}", green("✔"), bold(&done.to_string()));
        } else {
            eprintln!(
                "{} {} {noun}  ({} failed)",
                if done == 0 { red("✘") } else { cyan("⚠") },
                bold(&done.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

impl HarvestProgress for CliProgress {
    fn on_downloads_start(&self, total: usize) {
        self.start_phase("Downloading", "PDFs", total);
    }

    fn on_download_complete(&self, _url: &str, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
        self.bar.inc(1);
    }

    fn on_download_error(&self, url: &str, error: &str) {
        self.fail_line(url, error);
    }

    fn on_downloads_finished(&self, completed: usize, failed: usize) {
        self.finish_phase(completed, failed, "PDFs downloaded");
    }

    fn on_conversion_start(&self, total: usize) {
        self.start_phase("Converting", "files", total);
    }

    fn on_document_complete(&self, name: &str, used_ocr: bool) {
        if used_ocr {
            self.bar
                .println(format!("  {} {}  {}", green("✓"), name, dim("(OCR)")));
        }
        self.bar.set_message(name.to_string());
        self.bar.inc(1);
    }

    fn on_document_skipped(&self, _name: &str) {
        self.bar.inc(1);
    }

    fn on_document_error(&self, name: &str, error: &str) {
        self.fail_line(name, error);
    }

    fn on_conversion_finished(&self, converted: usize, failed: usize) {
        self.finish_phase(converted, failed, "PDFs converted to text");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download every PDF linked from the default page
  pdfharvest

  # Another page, relative links resolved against its URL
  pdfharvest --file reports.html --base https://example.org/reports/ --out reports

  # Download and convert to text, 10 downloads at a time
  pdfharvest -c 10 --text

  # Machine-readable report
  pdfharvest --text --json > report.json

  # OCR scanned pages with a vision model instead of tesseract
  pdfharvest --text --ocr-engine vision --provider openai --model gpt-4.1-nano

OUTPUT:
  <out>/<name>.pdf        one file per link, named by the URL's last segment
  <textout>/<name>.txt    "--- Page N ---" blocks, or "--- Page N (OCR) ---"
                          when the PDF has no text layer

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (needed for --text)
  OPENAI_API_KEY          API key for --ocr-engine vision (or ANTHROPIC_API_KEY, ...)
  EDGEQUAKE_LLM_PROVIDER  Vision provider when --provider is not given
  EDGEQUAKE_MODEL         Vision model when --model is not given
  RUST_LOG                Overrides the log filter
  Every flag can also be set through PDFHARVEST_<FLAG>.
"#;

/// Download the PDFs linked from an HTML page and convert them to text.
#[derive(Parser, Debug)]
#[command(
    name = "pdfharvest",
    version,
    about = "Download the PDFs linked from an HTML page and convert them to text",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local HTML file to scan for links.
    #[arg(long, env = "PDFHARVEST_FILE", default_value = DEFAULT_HTML_FILE)]
    file: PathBuf,

    /// Base URL that relative links are resolved against.
    #[arg(long, env = "PDFHARVEST_BASE", default_value = DEFAULT_BASE_URL)]
    base: String,

    /// Directory for downloaded PDFs.
    #[arg(long, env = "PDFHARVEST_OUT", default_value = DEFAULT_PDF_DIR)]
    out: PathBuf,

    /// Directory for converted text files.
    #[arg(long, env = "PDFHARVEST_TEXTOUT", default_value = DEFAULT_TEXT_DIR)]
    textout: PathBuf,

    /// Maximum simultaneous downloads.
    #[arg(short, long, env = "PDFHARVEST_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY,
          value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    concurrency: usize,

    /// User-Agent header for downloads.
    #[arg(long, env = "PDFHARVEST_UA", default_value = DEFAULT_USER_AGENT)]
    ua: String,

    /// Convert the downloaded PDFs to text.
    #[arg(long, env = "PDFHARVEST_TEXT")]
    text: bool,

    /// Only links whose href ends with this suffix are downloaded.
    #[arg(long, env = "PDFHARVEST_EXT", default_value = DEFAULT_EXTENSION)]
    ext: String,

    /// OCR engine for PDFs without a text layer.
    #[arg(long, env = "PDFHARVEST_OCR_ENGINE", value_enum, default_value = "tesseract")]
    ocr_engine: OcrEngineArg,

    /// OCR language, e.g. "eng" or "deu". Engine default if unset.
    #[arg(long, env = "PDFHARVEST_OCR_LANG")]
    ocr_lang: Option<String>,

    /// Tesseract executable name or path.
    #[arg(long, env = "PDFHARVEST_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "PDFHARVEST_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Vision OCR model ID (e.g. gpt-4.1-nano).
    #[arg(long, env = "PDFHARVEST_MODEL")]
    model: Option<String>,

    /// Vision OCR provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PDFHARVEST_PROVIDER")]
    provider: Option<String>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDFHARVEST_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFHARVEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFHARVEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFHARVEST_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrEngineArg {
    Tesseract,
    Vision,
}

impl From<OcrEngineArg> for OcrBackend {
    fn from(v: OcrEngineArg) -> Self {
        match v {
            OcrEngineArg::Tesseract => OcrBackend::Tesseract,
            OcrEngineArg::Vision => OcrBackend::Vision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Only warnings are logged while the progress bar is drawn.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stdout)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new() as Arc<dyn HarvestProgress>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = harvest(&config).await.context("Harvest failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `HarvestConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<HarvestConfig> {
    let mut builder = HarvestConfig::builder()
        .html_file(&cli.file)
        .base_url(&cli.base)
        .pdf_dir(&cli.out)
        .text_dir(&cli.textout)
        .concurrency(cli.concurrency)
        .user_agent(&cli.ua)
        .convert_text(cli.text)
        .extension(&cli.ext)
        .ocr(cli.ocr_engine.clone().into())
        .tesseract_cmd(&cli.tesseract)
        .dpi(cli.dpi);

    if let Some(ref lang) = cli.ocr_lang {
        builder = builder.ocr_language(lang);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &HarvestReport) {
    eprintln!(
        "{}  {} links  {} already present  {} downloaded  {} failed",
        if report.downloads.failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        report.links_found,
        report.skipped_existing,
        report.downloads.completed,
        report.downloads.failed,
    );
    if let Some(ref conv) = report.conversion {
        eprintln!(
            "   {} converted ({} via OCR)  {}",
            conv.converted(),
            conv.converted_ocr,
            dim(&format!(
                "{} already converted, {} failed",
                conv.skipped_existing, conv.failed
            )),
        );
    }
}
