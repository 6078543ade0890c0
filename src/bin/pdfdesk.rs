//! Server binary for edgequake-pdfdesk.
//!
//! A thin shim over the library crate: maps CLI flags to `DeskConfig`,
//! makes sure PDFium is available, loads the pipelines and serves.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use edgequake_pdfdesk::{serve, Backend, DeskConfig, ModelIds, Pipelines, PdfiumLoader};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Hugging Face backend on the default port (5000)
  HF_TOKEN=hf_... pdfdesk

  # Listen on all interfaces
  pdfdesk --host 0.0.0.0 --port 8080

  # Serve every operation through a chat LLM instead
  pdfdesk --backend llm --provider openai --model gpt-4.1-mini

  # Smaller translation chunks for a model with a short input window
  pdfdesk --translation-chunk-width 200

OPERATIONS:
  Question and Answer   whole text + your question → extracted answer
  Summarize PDF         whole text → 30–130 word summary
  Translate PDF         300-char chunks → English→Urdu, joined in order
  Generate Questions    1024-char chunks → de-duplicated questions

ENVIRONMENT VARIABLES:
  HF_TOKEN                Hugging Face API token
  OPENAI_API_KEY          OpenAI API key (LLM backend)
  ANTHROPIC_API_KEY       Anthropic API key (LLM backend)
  EDGEQUAKE_LLM_PROVIDER  Provider for the LLM backend
  EDGEQUAKE_MODEL         Model for the LLM backend
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, overrides --verbose / --quiet

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdfdesk/pdfium-7690/.
"#;

#[derive(Parser, Debug)]
#[command(
    name = "pdfdesk",
    version,
    about = "Upload a PDF to ask, summarise, translate or generate questions",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[arg(long, env = "PDFDESK_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "PDFDESK_PORT", default_value_t = 5000)]
    port: u16,

    #[arg(long, env = "PDFDESK_BACKEND", value_enum, default_value = "huggingface")]
    backend: BackendArg,

    #[arg(long, env = "PDFDESK_HF_ENDPOINT", default_value = edgequake_pdfdesk::DEFAULT_HF_ENDPOINT)]
    hf_endpoint: String,

    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    #[arg(long, env = "PDFDESK_QA_MODEL")]
    qa_model: Option<String>,

    #[arg(long, env = "PDFDESK_SUMMARY_MODEL")]
    summary_model: Option<String>,

    #[arg(long, env = "PDFDESK_TRANSLATION_MODEL")]
    translation_model: Option<String>,

    #[arg(long, env = "PDFDESK_GENERATION_MODEL")]
    generation_model: Option<String>,

    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    #[arg(long, env = "PDFDESK_TRANSLATION_CHUNK_WIDTH", default_value_t = 300)]
    translation_chunk_width: usize,

    #[arg(long, env = "PDFDESK_CHUNK_WIDTH", default_value_t = 1024)]
    chunk_width: usize,

    #[arg(long, env = "PDFDESK_MAX_UPLOAD_MB", default_value_t = 32)]
    max_upload_mb: usize,

    #[arg(long, env = "PDFDESK_API_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    #[arg(short, long, env = "PDFDESK_VERBOSE")]
    verbose: bool,

    #[arg(short, long, env = "PDFDESK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BackendArg {
    Huggingface,
    Llm,
}

impl From<BackendArg> for Backend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Huggingface => Backend::HuggingFace,
            BackendArg::Llm => Backend::Llm,
        }
    }
}

impl Cli {
    fn models(&self) -> ModelIds {
        let defaults = ModelIds::default();
        ModelIds {
            question_answering: self.qa_model.clone().unwrap_or(defaults.question_answering),
            summarization: self.summary_model.clone().unwrap_or(defaults.summarization),
            translation: self.translation_model.clone().unwrap_or(defaults.translation),
            text_generation: self.generation_model.clone().unwrap_or(defaults.text_generation),
        }
    }

    fn to_config(&self, pdfium_lib: PathBuf) -> Result<DeskConfig> {
        let mut builder = DeskConfig::builder()
            .host(&self.host)
            .port(self.port)
            .backend(self.backend.clone().into())
            .models(self.models())
            .hf_endpoint(&self.hf_endpoint)
            .translation_chunk_width(self.translation_chunk_width)
            .default_chunk_width(self.chunk_width)
            .max_upload_bytes(self.max_upload_mb.saturating_mul(1024 * 1024))
            .api_timeout_secs(self.timeout)
            .pdfium_lib_path(pdfium_lib);

        if let Some(ref token) = self.hf_token {
            builder = builder.hf_token(token);
        }
        if let Some(ref provider) = self.provider {
            builder = builder.provider_name(provider);
        }
        if let Some(ref model) = self.model {
            builder = builder.model(model);
        }

        builder.build().context("Invalid configuration")
    }
}

fn download_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {bytes}/{total_bytes}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    bar.set_prefix("PDFium");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info,tower_http=debug"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────
    // First run downloads ~30 MB; later runs only check the cache path.
    let explicit = cli.pdfium_lib.as_deref();
    let pdfium_lib = if cli.quiet || pdfium_auto::find_existing(explicit).is_some() {
        tokio::task::block_in_place(|| pdfium_auto::locate(explicit, None))
    } else {
        let bar = download_bar();
        let result = tokio::task::block_in_place(|| {
            pdfium_auto::locate(
                explicit,
                Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length() != Some(t) {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }),
            )
        });
        match &result {
            Ok(_) => bar.finish_with_message("ready"),
            Err(_) => bar.abandon_with_message("failed"),
        }
        result
    }
    .context("Failed to locate or download the PDFium engine")?;
    info!("PDFium library: {}", pdfium_lib.display());

    // ── Configuration + pipelines (once, before serving) ────────────────
    let config = cli.to_config(pdfium_lib)?;
    let pipelines = Pipelines::load(&config).context("Failed to load inference pipelines")?;
    let loader = Arc::new(PdfiumLoader::from_config(&config).context("Failed to set up PDFium")?);

    serve(config, pipelines, loader)
        .await
        .context("Server terminated with an error")?;

    Ok(())
}
