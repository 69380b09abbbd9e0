//! OCR backends for image-only documents.
//!
//! * [`TesseractOcr`] (default) runs the `tesseract` executable with the PNG
//!   on stdin and reads the text from stdout. No `-l` flag is passed unless a
//!   language override is configured, so tesseract uses its default model.
//! * [`VisionOcr`] sends the page to a vision LLM through `edgequake-llm`.
//!
//! Engines see one page at a time and know nothing about page numbers; the
//! caller attaches those.

use crate::error::{HarvestError, OcrError};
use crate::pipeline::encode::to_image_data;
use crate::prompts::OCR_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Recognises the text in one PNG-encoded page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError>;
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// OCR through the `tesseract` command-line program.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    cmd: String,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new(cmd: impl Into<String>, language: Option<String>) -> Self {
        Self {
            cmd: cmd.into(),
            language,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.cmd);
        cmd.arg("stdin").arg("stdout");
        if let Some(ref lang) = self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", None)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        let mut child = self.command().spawn().map_err(|source| OcrError::Spawn {
            cmd: self.cmd.clone(),
            source,
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| OcrError::Input {
            cmd: self.cmd.clone(),
            source: std::io::Error::other("stdin was not captured"),
        })?;

        // stdin must be fed while stdout is drained, or a large page can
        // fill both pipes and deadlock.
        let feed = async move {
            let result = stdin.write_all(png).await;
            drop(stdin);
            result
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|source| OcrError::Spawn {
            cmd: self.cmd.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                cmd: self.cmd.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed.map_err(|source| OcrError::Input {
            cmd: self.cmd.clone(),
            source,
        })?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract recognised {} chars", text.len());
        Ok(text)
    }
}

// ── Vision LLM ───────────────────────────────────────────────────────────

/// OCR through a vision-capable LLM.
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl VisionOcr {
    /// Use a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(0.0),
                max_tokens: Some(4096),
                ..Default::default()
            },
        }
    }

    /// Resolve a provider from explicit settings, then from the environment.
    ///
    /// 1. `provider_name` (+ `model`, default `gpt-4.1-nano`)
    /// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
    /// 3. `ProviderFactory::from_env` auto-detection
    pub fn from_settings(
        provider_name: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self, HarvestError> {
        if let Some(name) = provider_name {
            return create_provider(name, model.unwrap_or("gpt-4.1-nano")).map(Self::new);
        }

        if let (Ok(prov), Ok(env_model)) = (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            if !prov.is_empty() && !env_model.is_empty() {
                return create_provider(&prov, model.unwrap_or(&env_model)).map(Self::new);
            }
        }

        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| HarvestError::OcrUnavailable {
                engine: "vision".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                    Error: {}",
                    e
                ),
            })?;
        Ok(Self::new(provider))
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, HarvestError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| HarvestError::OcrUnavailable {
        engine: format!("vision ({name})"),
        hint: format!("{e}"),
    })
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        let messages = vec![
            ChatMessage::system(OCR_SYSTEM_PROMPT),
            ChatMessage::user_with_images("", vec![to_image_data(png)]),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| OcrError::Vision(e.to_string()))?;

        debug!(
            "vision OCR: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(clean_transcription(&response.content))
    }
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-z]*\n(.*)\n```\s*$").expect("static regex is valid"));

/// Models sometimes wrap the transcription in a code fence despite the
/// prompt; unwrap it and normalise line endings.
fn clean_transcription(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    };
    unfenced.replace("\r\n", "\n").replace('\r', "\n")
}
