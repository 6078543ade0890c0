//! Task-specific models on the Hugging Face inference API.
//!
//! One [`HuggingFacePipeline`] per model. A call POSTs a JSON body to
//! `{endpoint}/{model}`:
//!
//! | Task        | `inputs`                    | response                     |
//! |-------------|-----------------------------|------------------------------|
//! | answer      | `{"question","context"}`    | `{"answer": ...}`            |
//! | summarize   | text                        | `[{"summary_text": ...}]`    |
//! | translate   | text                        | `[{"translation_text": ...}]`|
//! | generate    | prompt                      | `[{"generated_text": ...}]`  |
//!
//! Task knobs go under `parameters`; `options.wait_for_model` makes a cold
//! model load instead of failing with 503. Body building and response
//! parsing are plain functions so they can be tested without a server.

use super::{Task, TextPipeline};
use crate::config::DeskConfig;
use crate::error::{InferenceError, PdfDeskError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Longest error body kept in an [`InferenceError::Http`].
const MAX_ERROR_BODY: usize = 300;

/// Shared HTTP client with the configured per-call timeout.
pub fn build_client(config: &DeskConfig) -> Result<Client, PdfDeskError> {
    if config.hf_token.is_none() {
        warn!("HF_TOKEN is not set; Hugging Face requests will be anonymous and heavily rate limited");
    }
    Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .build()
        .map_err(|e| PdfDeskError::BackendNotConfigured {
            backend: "huggingface".to_string(),
            hint: format!("Could not build HTTP client: {e}"),
        })
}

/// A single model behind the Hugging Face inference API.
#[derive(Debug, Clone)]
pub struct HuggingFacePipeline {
    client: Client,
    url: String,
    model: String,
    token: Option<String>,
    timeout_secs: u64,
}

impl HuggingFacePipeline {
    pub fn new(client: Client, config: &DeskConfig, model: &str) -> Self {
        Self {
            client,
            url: format!("{}/{}", config.hf_endpoint, model),
            model: model.to_string(),
            token: config.hf_token.clone(),
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Full model URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                pipeline: self.model.clone(),
                secs: self.timeout_secs,
            }
        } else {
            InferenceError::Transport {
                pipeline: self.model.clone(),
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl TextPipeline for HuggingFacePipeline {
    fn name(&self) -> &str {
        &self.model
    }

    async fn run(&self, task: Task<'_>) -> Result<String, InferenceError> {
        let start = Instant::now();
        let body = request_body(&task);

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(status_error(&self.model, status, retry_after, &text));
        }

        let output = parse_output(&self.model, &task, &text)?;
        debug!(
            "{} ({}): {} bytes in, {} bytes out, {:?}",
            self.model,
            task.kind(),
            task.input_len(),
            output.len(),
            start.elapsed()
        );
        Ok(output)
    }
}

// ── Request bodies ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Request<I: Serialize> {
    inputs: I,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    options: Options,
}

#[derive(Debug, Serialize)]
struct QuestionInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    do_sample: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_return_sequences: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Options {
    wait_for_model: bool,
}

const OPTIONS: Options = Options {
    wait_for_model: true,
};

/// JSON body for `task`.
fn request_body(task: &Task<'_>) -> serde_json::Value {
    let value = match *task {
        Task::Answer { question, context } => serde_json::to_value(Request {
            inputs: QuestionInputs { question, context },
            parameters: None,
            options: OPTIONS,
        }),
        Task::Summarize {
            text,
            max_length,
            min_length,
            do_sample,
        } => serde_json::to_value(Request {
            inputs: text,
            parameters: Some(Parameters {
                max_length: Some(max_length),
                min_length: Some(min_length),
                do_sample: Some(do_sample),
                ..Default::default()
            }),
            options: OPTIONS,
        }),
        Task::Translate {
            text,
            max_length,
            truncation,
        } => serde_json::to_value(Request {
            inputs: text,
            parameters: Some(Parameters {
                max_length: Some(max_length),
                truncation: Some(truncation),
                ..Default::default()
            }),
            options: OPTIONS,
        }),
        Task::Generate {
            prompt,
            max_length,
            max_new_tokens,
            num_return_sequences,
        } => serde_json::to_value(Request {
            inputs: prompt,
            parameters: Some(Parameters {
                max_length: Some(max_length),
                max_new_tokens: Some(max_new_tokens),
                num_return_sequences: Some(num_return_sequences),
                ..Default::default()
            }),
            options: OPTIONS,
        }),
    };
    // Serialising these plain structs cannot fail.
    value.unwrap_or_default()
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(v) => v.into_iter().next(),
            OneOrMany::One(t) => Some(t),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerOut {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct SummaryOut {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct TranslationOut {
    translation_text: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedOut {
    generated_text: String,
}

/// Pull the output text for `task` out of a success body.
fn parse_output(pipeline: &str, task: &Task<'_>, body: &str) -> Result<String, InferenceError> {
    let malformed = |detail: String| InferenceError::MalformedResponse {
        pipeline: pipeline.to_string(),
        detail,
    };

    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return Err(malformed(err.error));
    }

    let first = match task {
        Task::Answer { .. } => serde_json::from_str::<OneOrMany<AnswerOut>>(body)
            .map(|r| r.into_first().map(|o| o.answer)),
        Task::Summarize { .. } => serde_json::from_str::<OneOrMany<SummaryOut>>(body)
            .map(|r| r.into_first().map(|o| o.summary_text)),
        Task::Translate { .. } => serde_json::from_str::<OneOrMany<TranslationOut>>(body)
            .map(|r| r.into_first().map(|o| o.translation_text)),
        Task::Generate { .. } => serde_json::from_str::<OneOrMany<GeneratedOut>>(body)
            .map(|r| r.into_first().map(|o| o.generated_text)),
    }
    .map_err(|e| malformed(format!("{} for {} output", e, task.kind())))?;

    first.ok_or_else(|| InferenceError::EmptyOutput {
        pipeline: pipeline.to_string(),
    })
}

/// Map a non-success status onto an [`InferenceError`].
fn status_error(
    pipeline: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> InferenceError {
    let pipeline = pipeline.to_string();
    let detail = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| truncate(body, MAX_ERROR_BODY));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InferenceError::Auth { pipeline, detail },
        StatusCode::TOO_MANY_REQUESTS => InferenceError::RateLimited {
            pipeline,
            retry_after_secs,
        },
        _ => InferenceError::Http {
            pipeline,
            status: status.as_u16(),
            body: detail,
        },
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}
