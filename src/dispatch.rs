//! Model dispatch: route extracted text to the pipeline for an operation.
//!
//! | Operation           | Input                  | Calls                    |
//! |---------------------|------------------------|--------------------------|
//! | Question answering  | whole text + query     | one                      |
//! | Summarize           | whole text             | one                      |
//! | Translate           | 300-char chunks        | one per chunk, in order  |
//! | Generate questions  | 1024-char chunks       | one per chunk, in order  |
//!
//! Chunked operations are strictly sequential: chunk *i+1* is never sent
//! before chunk *i* has returned, and the first failure aborts the whole
//! operation with no partial output.

use crate::config::DeskConfig;
use crate::error::PdfDeskError;
use crate::inference::{Pipelines, Task};
use crate::operation::Operation;
use crate::pipeline::chunk::chunk_text;
use crate::progress::{ProgressCallback, TracingProgress};
use crate::prompts::{question_prompt, word_count};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub struct Request {
    pub operation: Operation,
    /// Full extracted document text.
    pub text: String,
    /// User question; required for question answering.
    pub query: Option<String>,
}

/// Output of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Answer(String),
    Summary(String),
    Translation(String),
    /// Generated questions, in first-seen order, without duplicates.
    Questions(Vec<String>),
}

impl OperationResult {
    /// Operation that produced this result.
    pub fn operation(&self) -> Operation {
        match self {
            OperationResult::Answer(_) => Operation::QuestionAnswering,
            OperationResult::Summary(_) => Operation::Summarize,
            OperationResult::Translation(_) => Operation::Translate,
            OperationResult::Questions(_) => Operation::GenerateQuestions,
        }
    }
}

/// Text as shown to the user. Questions are one per line.
impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Answer(s)
            | OperationResult::Summary(s)
            | OperationResult::Translation(s) => f.write_str(s),
            OperationResult::Questions(qs) => f.write_str(&qs.join("\n")),
        }
    }
}

/// Routes requests to the shared pipelines.
pub struct Dispatcher {
    pipelines: Pipelines,
    config: DeskConfig,
    progress: ProgressCallback,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pipelines", &self.pipelines)
            .field("config", &self.config)
            .finish()
    }
}

impl Dispatcher {
    /// Dispatcher reporting progress through [`TracingProgress`].
    pub fn new(pipelines: Pipelines, config: DeskConfig) -> Self {
        Self {
            pipelines,
            config,
            progress: Arc::new(TracingProgress),
        }
    }

    /// Replace the progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Run `request` to completion.
    pub async fn dispatch(&self, request: Request) -> Result<OperationResult, PdfDeskError> {
        let start = Instant::now();
        let operation = request.operation;
        info!(
            "{}: {} chars of text",
            operation,
            request.text.chars().count()
        );

        let result = match operation {
            Operation::QuestionAnswering => {
                let query = request
                    .query
                    .as_deref()
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .ok_or(PdfDeskError::MissingField {
                        field: "user_query",
                    })?;
                self.answer(query, &request.text).await?
            }
            Operation::Summarize => self.summarize(&request.text).await?,
            Operation::Translate => self.translate(&request.text).await?,
            Operation::GenerateQuestions => self.generate_questions(&request.text).await?,
        };

        debug!("{} finished in {:?}", operation, start.elapsed());
        Ok(result)
    }

    async fn answer(&self, question: &str, context: &str) -> Result<OperationResult, PdfDeskError> {
        let answer = self
            .pipelines
            .question_answering
            .run(Task::Answer { question, context })
            .await
            .map_err(|source| PdfDeskError::Inference {
                operation: Operation::QuestionAnswering,
                source,
            })?;
        Ok(OperationResult::Answer(answer))
    }

    async fn summarize(&self, text: &str) -> Result<OperationResult, PdfDeskError> {
        let summary = self
            .pipelines
            .summarization
            .run(Task::Summarize {
                text,
                max_length: self.config.summary_max_length,
                min_length: self.config.summary_min_length,
                do_sample: self.config.summary_do_sample,
            })
            .await
            .map_err(|source| PdfDeskError::Inference {
                operation: Operation::Summarize,
                source,
            })?;
        Ok(OperationResult::Summary(summary))
    }

    async fn translate(&self, text: &str) -> Result<OperationResult, PdfDeskError> {
        let op = Operation::Translate;
        let chunks = chunk_text(text, self.config.translation_width()?);
        let total = chunks.len();
        self.progress.on_operation_start(op, total);

        let mut parts = Vec::with_capacity(total);
        for (i, chunk) in chunks.enumerate() {
            let n = i + 1;
            self.progress.on_chunk_start(op, n, total);
            let task = Task::Translate {
                text: chunk,
                max_length: self.config.translation_max_length,
                truncation: true,
            };
            match self.pipelines.translation.run(task).await {
                Ok(out) => {
                    self.progress.on_chunk_complete(op, n, total, out.len());
                    parts.push(out);
                }
                Err(source) => {
                    self.progress.on_chunk_error(op, n, total, &source.to_string());
                    return Err(PdfDeskError::ChunkInference {
                        operation: op,
                        chunk: n,
                        total,
                        source,
                    });
                }
            }
        }

        self.progress.on_operation_complete(op, total);
        Ok(OperationResult::Translation(parts.join(" ")))
    }

    async fn generate_questions(&self, text: &str) -> Result<OperationResult, PdfDeskError> {
        let op = Operation::GenerateQuestions;
        let chunks = chunk_text(text, self.config.default_width()?);
        let total = chunks.len();
        self.progress.on_operation_start(op, total);

        let mut questions = Vec::new();
        for (i, chunk) in chunks.enumerate() {
            let n = i + 1;
            self.progress.on_chunk_start(op, n, total);
            let prompt = question_prompt(chunk);
            let task = Task::Generate {
                prompt: &prompt,
                max_length: self.config.question_base_max_length + word_count(&prompt),
                max_new_tokens: self.config.question_max_new_tokens,
                num_return_sequences: 1,
            };
            match self.pipelines.text_generation.run(task).await {
                Ok(out) => {
                    self.progress.on_chunk_complete(op, n, total, out.len());
                    merge_questions(&mut questions, &out);
                }
                Err(source) => {
                    self.progress.on_chunk_error(op, n, total, &source.to_string());
                    return Err(PdfDeskError::ChunkInference {
                        operation: op,
                        chunk: n,
                        total,
                        source,
                    });
                }
            }
        }

        self.progress.on_operation_complete(op, total);
        Ok(OperationResult::Questions(questions))
    }
}

/// Append each non-empty trimmed line of `generated` unless already present.
///
/// The first occurrence keeps its position.
pub fn merge_questions(questions: &mut Vec<String>, generated: &str) {
    for line in generated.trim().split('\n') {
        let line = line.trim();
        if !line.is_empty() && !questions.iter().any(|q| q == line) {
            questions.push(line.to_string());
        }
    }
}
