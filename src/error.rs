//! Error types for the edgequake-pdfdesk library.
//!
//! Two error types mirror the two layers a request passes through:
//!
//! * [`PdfDeskError`] — ends the request. Its `Display` output is exactly
//!   what the user sees in the error slot of the rendered page, so every
//!   message is written for a person, not for a log file.
//!
//! * [`InferenceError`] — a single call into a pretrained pipeline failed.
//!   The dispatcher wraps it with the operation (and, for chunked
//!   operations, the chunk position) before it becomes a [`PdfDeskError`].

use crate::operation::Operation;
use thiserror::Error;

/// All request-ending errors.
#[derive(Debug, Error)]
pub enum PdfDeskError {
    // ── Form / upload errors ──────────────────────────────────────────────
    /// No document was attached to the submission.
    #[error("No file uploaded.")]
    MissingFile,

    /// A field required by the selected operation is absent or blank.
    #[error("Missing required field '{field}'.")]
    MissingField { field: &'static str },

    /// The `option` field does not name one of the four operations.
    #[error("Unknown operation '{value}'. Choose one of: {}.", Operation::form_values().join(", "))]
    UnknownOperation { value: String },

    /// The multipart body itself could not be read.
    #[error("Invalid form submission: {0}")]
    InvalidForm(String),

    /// The upload exceeded the configured body limit.
    #[error("Uploaded file is too large (limit is {limit_bytes} bytes).")]
    UploadTooLarge { limit_bytes: usize },

    /// Could not write the upload to temporary storage.
    #[error("Failed to store the uploaded file: {0}")]
    UploadFailed(#[source] std::io::Error),

    // ── Document errors ───────────────────────────────────────────────────
    /// The payload does not start with the `%PDF` signature.
    #[error("Uploaded file is not a PDF (first bytes: {magic:?}).")]
    NotAPdf { magic: Vec<u8> },

    /// The PDF could not be parsed into text.
    #[error("Could not read the PDF: {detail}")]
    DocumentParse { detail: String },

    /// The PDF is encrypted.
    #[error("The PDF is password protected and cannot be read.")]
    PasswordRequired,

    // ── Inference errors ──────────────────────────────────────────────────
    /// A whole-text pipeline call failed.
    #[error("An error occurred during {}: {source}", .operation.activity())]
    Inference {
        operation: Operation,
        #[source]
        source: InferenceError,
    },

    /// A per-chunk pipeline call failed; the remaining chunks were skipped.
    #[error("An error occurred during {} (chunk {chunk}/{total}): {source}", .operation.activity())]
    ChunkInference {
        operation: Operation,
        chunk: usize,
        total: usize,
        #[source]
        source: InferenceError,
    },

    /// The inference backend could not be initialised.
    #[error("Inference backend '{backend}' is not configured.\n{hint}")]
    BackendNotConfigured { backend: String, hint: String },

    // ── Setup errors ──────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or check your internet connection \
so the library can be downloaded."
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfDeskError {
    /// True when the request itself was at fault (4xx territory).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PdfDeskError::MissingFile
                | PdfDeskError::MissingField { .. }
                | PdfDeskError::UnknownOperation { .. }
                | PdfDeskError::InvalidForm(_)
                | PdfDeskError::UploadTooLarge { .. }
                | PdfDeskError::NotAPdf { .. }
                | PdfDeskError::DocumentParse { .. }
                | PdfDeskError::PasswordRequired
        )
    }

    /// True when a pretrained pipeline call failed.
    pub fn is_inference_error(&self) -> bool {
        matches!(
            self,
            PdfDeskError::Inference { .. } | PdfDeskError::ChunkInference { .. }
        )
    }
}

/// Failure of a single pipeline invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Network-level failure before a response arrived.
    #[error("request to '{pipeline}' failed: {detail}")]
    Transport { pipeline: String, detail: String },

    /// The call did not finish in time.
    #[error("'{pipeline}' did not answer within {secs}s")]
    Timeout { pipeline: String, secs: u64 },

    /// HTTP 401/403 from the backend.
    #[error("'{pipeline}' rejected the credentials: {detail}")]
    Auth { pipeline: String, detail: String },

    /// HTTP 429 from the backend.
    #[error("'{pipeline}' is rate limited{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited {
        pipeline: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success HTTP status.
    #[error("'{pipeline}' returned HTTP {status}: {body}")]
    Http {
        pipeline: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("'{pipeline}' returned an unexpected response: {detail}")]
    MalformedResponse { pipeline: String, detail: String },

    /// The response was well-formed but carried no output.
    #[error("'{pipeline}' returned no output")]
    EmptyOutput { pipeline: String },

    /// The chat provider reported an error.
    #[error("LLM provider error from '{pipeline}': {detail}")]
    Provider { pipeline: String, detail: String },
}
