//! # edgequake-pdfdesk
//!
//! Upload a PDF and ask it a question, summarise it, translate it, or
//! generate study questions from it, all through pretrained inference
//! pipelines, with the result rendered as a single HTML page.
//!
//! ## Request Flow
//!
//! ```text
//! multipart form
//!  │
//!  ├─ 1. Upload    validate fields, store PDF in a request-scoped temp file
//!  ├─ 2. Extract   page texts via pdfium (spawn_blocking), joined by spaces
//!  ├─ 3. Chunk     fixed-width slices (300 chars translate, 1024 questions)
//!  ├─ 4. Dispatch  one pipeline call, or one per chunk strictly in order
//!  └─ 5. Render    askama view: form + answer | summary | translation | questions | error
//! ```
//!
//! ## Operations
//!
//! | Form value            | Pipeline            | Input                    |
//! |-----------------------|---------------------|--------------------------|
//! | `Question and Answer` | question answering  | whole text + user query  |
//! | `Summarize PDF`       | summarization       | whole text               |
//! | `Translate PDF`       | translation (en→ur) | 300-char chunks          |
//! | `Generate Questions`  | text generation     | 1024-char chunks, dedup  |
//!
//! ## Library Use
//!
//! ```rust,no_run
//! use edgequake_pdfdesk::{DeskConfig, Dispatcher, Operation, Pipelines, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Hugging Face backend; token from HF_TOKEN
//!     let config = DeskConfig::builder()
//!         .hf_token(std::env::var("HF_TOKEN")?)
//!         .build()?;
//!     let dispatcher = Dispatcher::new(Pipelines::load(&config)?, config);
//!     let result = dispatcher
//!         .dispatch(Request {
//!             operation: Operation::Summarize,
//!             text: std::fs::read_to_string("notes.txt")?,
//!             query: None,
//!         })
//!         .await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdesk` server binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inference;
pub mod operation;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Backend, DeskConfig, DeskConfigBuilder, ModelIds, DEFAULT_HF_ENDPOINT};
pub use dispatch::{Dispatcher, OperationResult, Request};
pub use error::{InferenceError, PdfDeskError};
pub use inference::{HuggingFacePipeline, LlmPipeline, Pipelines, Task, TextPipeline};
pub use operation::Operation;
pub use pipeline::extract::{extract_text, DocumentLoader, PdfiumLoader};
pub use pipeline::upload::{UploadForm, UploadedDocument};
pub use progress::{ChunkProgressCallback, NoopProgressCallback, ProgressCallback, TracingProgress};
pub use render::DeskView;
pub use server::{create_router, serve, AppState};
