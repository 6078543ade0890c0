//! Pretrained inference capabilities.
//!
//! Every operation is served by one [`TextPipeline`]: an opaque
//! text-in/text-out capability. Two families implement it:
//!
//! * [`huggingface::HuggingFacePipeline`] — one task-specific model per
//!   operation on the Hugging Face inference API (the default).
//! * [`llm::LlmPipeline`] — a chat LLM from `edgequake-llm`, told what to do
//!   through the prompts in [`crate::prompts`].
//!
//! [`Pipelines`] is the set of four handles. It is built once at startup and
//! then only read, so requests can share it freely.

pub mod huggingface;
pub mod llm;

use crate::config::{Backend, DeskConfig};
use crate::error::{InferenceError, PdfDeskError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub use huggingface::HuggingFacePipeline;
pub use llm::LlmPipeline;

/// One request to a pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task<'a> {
    /// Extractive question answering: find the span of `context` answering `question`.
    Answer { question: &'a str, context: &'a str },
    /// Abstractive summary bounded by `min_length..=max_length`.
    Summarize {
        text: &'a str,
        max_length: usize,
        min_length: usize,
        do_sample: bool,
    },
    /// Translation; input beyond `max_length` is cut when `truncation` is set.
    Translate {
        text: &'a str,
        max_length: usize,
        truncation: bool,
    },
    /// Free generation continuing `prompt`.
    Generate {
        prompt: &'a str,
        max_length: usize,
        max_new_tokens: usize,
        num_return_sequences: usize,
    },
}

impl Task<'_> {
    /// Short task name used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Answer { .. } => "question-answering",
            Task::Summarize { .. } => "summarization",
            Task::Translate { .. } => "translation",
            Task::Generate { .. } => "text-generation",
        }
    }

    /// Size of the main text input, in bytes.
    pub fn input_len(&self) -> usize {
        match self {
            Task::Answer { context, .. } => context.len(),
            Task::Summarize { text, .. } | Task::Translate { text, .. } => text.len(),
            Task::Generate { prompt, .. } => prompt.len(),
        }
    }
}

/// A pretrained text-in/text-out capability.
#[async_trait]
pub trait TextPipeline: Send + Sync {
    /// Name shown in errors and logs (usually the model id).
    fn name(&self) -> &str;

    /// Run one task and return the pipeline's text output.
    async fn run(&self, task: Task<'_>) -> Result<String, InferenceError>;
}

/// The four pipeline handles, one per operation.
#[derive(Clone)]
pub struct Pipelines {
    pub question_answering: Arc<dyn TextPipeline>,
    pub summarization: Arc<dyn TextPipeline>,
    pub translation: Arc<dyn TextPipeline>,
    pub text_generation: Arc<dyn TextPipeline>,
}

impl fmt::Debug for Pipelines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipelines")
            .field("question_answering", &self.question_answering.name())
            .field("summarization", &self.summarization.name())
            .field("translation", &self.translation.name())
            .field("text_generation", &self.text_generation.name())
            .finish()
    }
}

impl Pipelines {
    /// Assemble a handle set from pre-built pipelines.
    pub fn from_parts(
        question_answering: Arc<dyn TextPipeline>,
        summarization: Arc<dyn TextPipeline>,
        translation: Arc<dyn TextPipeline>,
        text_generation: Arc<dyn TextPipeline>,
    ) -> Self {
        Self {
            question_answering,
            summarization,
            translation,
            text_generation,
        }
    }

    /// Build the handle set for the configured backend.
    pub fn load(config: &DeskConfig) -> Result<Self, PdfDeskError> {
        let pipelines = match config.backend {
            Backend::HuggingFace => {
                let client = huggingface::build_client(config)?;
                let make = |model: &str| -> Arc<dyn TextPipeline> {
                    Arc::new(HuggingFacePipeline::new(client.clone(), config, model))
                };
                Self::from_parts(
                    make(&config.models.question_answering),
                    make(&config.models.summarization),
                    make(&config.models.translation),
                    make(&config.models.text_generation),
                )
            }
            Backend::Llm => {
                let shared = Arc::new(LlmPipeline::from_config(config)?);
                Self::from_parts(shared.clone(), shared.clone(), shared.clone(), shared)
            }
        };
        info!("Loaded pipelines: {:?}", pipelines);
        Ok(pipelines)
    }
}
