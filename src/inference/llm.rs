//! Chat-LLM backend: all four tasks through one `edgequake-llm` provider.
//!
//! A chat model has no task head, so each [`Task`] becomes a system prompt
//! (from [`crate::prompts`]) plus a user message. Answer and summary run at
//! temperature 0 so repeated calls give the same output; generation uses
//! the configured sampling temperature.

use super::{Task, TextPipeline};
use crate::config::DeskConfig;
use crate::error::{InferenceError, PdfDeskError};
use crate::prompts::{
    answer_user_message, summary_system_prompt, translation_system_prompt, ANSWER_SYSTEM_PROMPT,
    CONTINUATION_SYSTEM_PROMPT, DEFAULT_TRANSLATION_TARGET,
};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Model used when a provider is named without one.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4.1-nano";

/// Completion budget for an extracted answer span.
const ANSWER_MAX_TOKENS: usize = 128;

/// A chat LLM serving every task.
pub struct LlmPipeline {
    provider: Arc<dyn LLMProvider>,
    label: String,
    generation_temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for LlmPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmPipeline")
            .field("label", &self.label)
            .field("generation_temperature", &self.generation_temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmPipeline {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        generation_temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            generation_temperature,
            timeout,
        }
    }

    /// Resolve the provider from `config` (or the environment) and wrap it.
    pub fn from_config(config: &DeskConfig) -> Result<Self, PdfDeskError> {
        let provider = resolve_provider(config)?;
        let label = match (&config.provider_name, &config.model) {
            (Some(p), Some(m)) => format!("{p}/{m}"),
            (Some(p), None) => p.clone(),
            (None, Some(m)) => m.clone(),
            (None, None) => "llm".to_string(),
        };
        info!("LLM backend ready ({})", label);
        Ok(Self::new(
            provider,
            label,
            config.generation_temperature,
            Duration::from_secs(config.api_timeout_secs),
        ))
    }
}

#[async_trait]
impl TextPipeline for LlmPipeline {
    fn name(&self) -> &str {
        &self.label
    }

    async fn run(&self, task: Task<'_>) -> Result<String, InferenceError> {
        let start = Instant::now();
        let (system, user) = prompt_for(&task);
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = options_for(&task, self.generation_temperature);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| InferenceError::Timeout {
                pipeline: self.label.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| InferenceError::Provider {
                pipeline: self.label.clone(),
                detail: e.to_string(),
            })?;

        debug!(
            "{} ({}): {} input tokens, {} output tokens, {:?}",
            self.label,
            task.kind(),
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        finish_output(&self.label, &task, response.content)
    }
}

/// System and user message for `task`.
fn prompt_for(task: &Task<'_>) -> (String, String) {
    match *task {
        Task::Answer { question, context } => (
            ANSWER_SYSTEM_PROMPT.to_string(),
            answer_user_message(question, context),
        ),
        Task::Summarize {
            text,
            max_length,
            min_length,
            ..
        } => (summary_system_prompt(min_length, max_length), text.to_string()),
        Task::Translate {
            text,
            max_length,
            truncation,
        } => {
            let text = if truncation {
                truncate_words(text, max_length)
            } else {
                text
            };
            (
                translation_system_prompt(DEFAULT_TRANSLATION_TARGET),
                text.to_string(),
            )
        }
        Task::Generate { prompt, .. } => (CONTINUATION_SYSTEM_PROMPT.to_string(), prompt.to_string()),
    }
}

/// Completion options for `task`.
fn options_for(task: &Task<'_>, generation_temperature: f32) -> CompletionOptions {
    let (temperature, max_tokens) = match *task {
        Task::Answer { .. } => (0.0, ANSWER_MAX_TOKENS),
        Task::Summarize {
            max_length,
            do_sample,
            ..
        } => {
            let t = if do_sample { generation_temperature } else { 0.0 };
            // Bounds are in words; leave room for tokenisation.
            (t, max_length * 2)
        }
        Task::Translate { max_length, .. } => (0.0, max_length),
        Task::Generate { max_new_tokens, .. } => (generation_temperature, max_new_tokens),
    };
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

/// Shape the completion like the matching task-specific model's output.
///
/// Generation echoes the prompt before the continuation, as a causal
/// generator's full text does.
fn finish_output(label: &str, task: &Task<'_>, content: String) -> Result<String, InferenceError> {
    let trimmed = content.trim();
    match *task {
        Task::Answer { .. } => Ok(trimmed.to_string()),
        Task::Generate { prompt, .. } => Ok(format!("{prompt}\n{trimmed}")),
        Task::Summarize { .. } | Task::Translate { .. } if trimmed.is_empty() => {
            Err(InferenceError::EmptyOutput {
                pipeline: label.to_string(),
            })
        }
        _ => Ok(trimmed.to_string()),
    }
}

/// Keep at most the first `max_words` whitespace-separated words of `text`.
fn truncate_words(text: &str, max_words: usize) -> &str {
    let mut words = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == max_words {
                return text[..i].trim_end();
            }
            words += 1;
            in_word = true;
        }
    }
    text
}

fn create_llm_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PdfDeskError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PdfDeskError::BackendNotConfigured {
            backend: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, most specific source first:
///
/// 1. a pre-built provider in the config
/// 2. `provider_name` (+ `model`, default [`DEFAULT_LLM_MODEL`])
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI when `OPENAI_API_KEY` is set
/// 5. whatever `ProviderFactory::from_env` detects
fn resolve_provider(config: &DeskConfig) -> Result<Arc<dyn LLMProvider>, PdfDeskError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL);
        return create_llm_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_llm_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL);
            return create_llm_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PdfDeskError::BackendNotConfigured {
            backend: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
