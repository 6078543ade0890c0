//! Configuration for the desk service.
//!
//! Everything tunable lives in [`DeskConfig`], built through
//! [`DeskConfigBuilder`]. The defaults reproduce the behaviour of the
//! original upload form: 300-character translation chunks, 1024-character
//! chunks for question generation, 130/30 summary bounds with sampling off,
//! a 512-unit translation input cap and a 100 + prompt-words / 50-new-token
//! generation budget.
//!
//! Chunk widths are plain values handed to each call. Nothing here is
//! mutated once a request is being served.

use crate::error::PdfDeskError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Hugging Face inference endpoint (model id is appended).
pub const DEFAULT_HF_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Configuration for the desk service.
///
/// # Example
/// ```rust
/// use edgequake_pdfdesk::{Backend, DeskConfig};
///
/// let config = DeskConfig::builder()
///     .backend(Backend::HuggingFace)
///     .translation_chunk_width(250)
///     .port(8080)
///     .build()
///     .unwrap();
/// assert_eq!(config.translation_chunk_width, 250);
/// ```
#[derive(Clone)]
pub struct DeskConfig {
    /// Address the HTTP server binds to. Default: `127.0.0.1`.
    pub host: String,

    /// Port the HTTP server listens on. Default: 5000.
    pub port: u16,

    /// Which family of pretrained pipelines serves the four operations.
    pub backend: Backend,

    /// Model ids used by the Hugging Face backend.
    pub models: ModelIds,

    /// Base URL of the Hugging Face inference API. Default: [`DEFAULT_HF_ENDPOINT`].
    pub hf_endpoint: String,

    /// Bearer token for the Hugging Face API (`HF_TOKEN`).
    pub hf_token: Option<String>,

    /// LLM provider name for the LLM backend (e.g. "openai", "ollama").
    pub provider_name: Option<String>,

    /// LLM model id for the LLM backend.
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Chunk width (characters) for question generation. Default: 1024.
    pub default_chunk_width: usize,

    /// Chunk width (characters) for translation. Default: 300.
    ///
    /// Smaller than the default width so each chunk stays inside the
    /// translation model's input window.
    pub translation_chunk_width: usize,

    /// Upper bound on summary length, in model output units. Default: 130.
    pub summary_max_length: usize,

    /// Lower bound on summary length. Default: 30.
    pub summary_min_length: usize,

    /// Whether the summarizer samples. Default: false (deterministic).
    pub summary_do_sample: bool,

    /// Input truncation cap for each translation call. Default: 512.
    pub translation_max_length: usize,

    /// Fixed part of the generation length budget. Default: 100.
    ///
    /// The prompt's own word count is added per chunk.
    pub question_base_max_length: usize,

    /// New-token budget per generation call. Default: 50.
    pub question_max_new_tokens: usize,

    /// Sampling temperature for question generation on the LLM backend. Default: 0.7.
    pub generation_temperature: f32,

    /// Per-call timeout for inference requests in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Largest accepted request body in bytes. Default: 32 MiB.
    pub max_upload_bytes: usize,

    /// Explicit path to libpdfium. If None, `pdfium-auto` resolves one.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            backend: Backend::default(),
            models: ModelIds::default(),
            hf_endpoint: DEFAULT_HF_ENDPOINT.to_string(),
            hf_token: None,
            provider_name: None,
            model: None,
            provider: None,
            default_chunk_width: 1024,
            translation_chunk_width: 300,
            summary_max_length: 130,
            summary_min_length: 30,
            summary_do_sample: false,
            translation_max_length: 512,
            question_base_max_length: 100,
            question_max_new_tokens: 50,
            generation_temperature: 0.7,
            api_timeout_secs: 120,
            max_upload_bytes: 32 * 1024 * 1024,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for DeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeskConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("backend", &self.backend)
            .field("models", &self.models)
            .field("hf_endpoint", &self.hf_endpoint)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("default_chunk_width", &self.default_chunk_width)
            .field("translation_chunk_width", &self.translation_chunk_width)
            .field("summary_max_length", &self.summary_max_length)
            .field("summary_min_length", &self.summary_min_length)
            .field("translation_max_length", &self.translation_max_length)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl DeskConfig {
    /// Create a new builder for `DeskConfig`.
    pub fn builder() -> DeskConfigBuilder {
        DeskConfigBuilder {
            config: Self::default(),
        }
    }

    /// Translation chunk width as a validated non-zero value.
    pub fn translation_width(&self) -> Result<NonZeroUsize, PdfDeskError> {
        non_zero("translation_chunk_width", self.translation_chunk_width)
    }

    /// Question-generation chunk width as a validated non-zero value.
    pub fn default_width(&self) -> Result<NonZeroUsize, PdfDeskError> {
        non_zero("default_chunk_width", self.default_chunk_width)
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_zero(name: &str, value: usize) -> Result<NonZeroUsize, PdfDeskError> {
    NonZeroUsize::new(value)
        .ok_or_else(|| PdfDeskError::InvalidConfig(format!("{name} must be ≥ 1, got 0")))
}

/// Builder for [`DeskConfig`].
#[derive(Debug)]
pub struct DeskConfigBuilder {
    config: DeskConfig,
}

impl DeskConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn models(mut self, models: ModelIds) -> Self {
        self.config.models = models;
        self
    }

    pub fn hf_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.hf_endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn hf_token(mut self, token: impl Into<String>) -> Self {
        self.config.hf_token = Some(token.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn default_chunk_width(mut self, width: usize) -> Self {
        self.config.default_chunk_width = width;
        self
    }

    pub fn translation_chunk_width(mut self, width: usize) -> Self {
        self.config.translation_chunk_width = width;
        self
    }

    pub fn summary_length(mut self, min: usize, max: usize) -> Self {
        self.config.summary_min_length = min;
        self.config.summary_max_length = max;
        self
    }

    pub fn summary_do_sample(mut self, v: bool) -> Self {
        self.config.summary_do_sample = v;
        self
    }

    pub fn translation_max_length(mut self, n: usize) -> Self {
        self.config.translation_max_length = n;
        self
    }

    pub fn question_budget(mut self, base_max_length: usize, max_new_tokens: usize) -> Self {
        self.config.question_base_max_length = base_max_length;
        self.config.question_max_new_tokens = max_new_tokens;
        self
    }

    pub fn generation_temperature(mut self, t: f32) -> Self {
        self.config.generation_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeskConfig, PdfDeskError> {
        let c = &self.config;
        c.translation_width()?;
        c.default_width()?;
        if c.summary_min_length > c.summary_max_length {
            return Err(PdfDeskError::InvalidConfig(format!(
                "summary min length ({}) exceeds max length ({})",
                c.summary_min_length, c.summary_max_length
            )));
        }
        if c.translation_max_length == 0 || c.question_max_new_tokens == 0 {
            return Err(PdfDeskError::InvalidConfig(
                "token budgets must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(PdfDeskError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PdfDeskError::InvalidConfig(
                "api timeout must be ≥ 1 second".into(),
            ));
        }
        if c.backend == Backend::HuggingFace {
            c.models.validate()?;
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Family of pretrained pipelines behind the four operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Task-specific models on the Hugging Face inference API. (default)
    #[default]
    HuggingFace,
    /// A chat LLM (via edgequake-llm) prompted per task.
    Llm,
}

/// Model ids for the Hugging Face backend, one per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIds {
    pub question_answering: String,
    pub summarization: String,
    pub translation: String,
    pub text_generation: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            question_answering: "deepset/minilm-uncased-squad2".to_string(),
            summarization: "facebook/bart-large-cnn".to_string(),
            translation: "Helsinki-NLP/opus-mt-en-ur".to_string(),
            text_generation: "EleutherAI/gpt-neo-125M".to_string(),
        }
    }
}

impl ModelIds {
    fn validate(&self) -> Result<(), PdfDeskError> {
        let all = [
            ("question_answering", &self.question_answering),
            ("summarization", &self.summarization),
            ("translation", &self.translation),
            ("text_generation", &self.text_generation),
        ];
        match all.iter().find(|(_, id)| id.trim().is_empty()) {
            Some((name, _)) => Err(PdfDeskError::InvalidConfig(format!(
                "model id for {name} is empty"
            ))),
            None => Ok(()),
        }
    }
}
