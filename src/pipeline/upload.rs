//! Upload handling: validate the submitted form and persist the PDF.
//!
//! pdfium reads from a file-system path, so the uploaded bytes are written to
//! a uniquely named `.pdf` temp file. The write handle is closed as soon as
//! the bytes are flushed; what remains is a [`tempfile::TempPath`] owned by
//! [`UploadedDocument`], and dropping it removes the file. Every request path
//! (answer, error, early return, panic unwind) therefore cleans up.

use crate::error::PdfDeskError;
use crate::operation::Operation;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// PDF signature every accepted upload must start with.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Raw form fields as received, before validation.
#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    /// `option` field.
    pub option: Option<String>,
    /// `pdf_file` field contents.
    pub pdf_file: Option<Vec<u8>>,
    /// `user_query` field.
    pub user_query: Option<String>,
}

/// A validated submission, ready for processing.
#[derive(Debug, Clone)]
pub struct Submission {
    pub operation: Operation,
    pub pdf: Vec<u8>,
    /// Trimmed, non-empty query. Always `Some` for question answering.
    pub query: Option<String>,
}

impl UploadForm {
    /// Validate the form.
    ///
    /// Checks run in this order, so the first problem wins:
    /// 1. no file, or an empty file part → [`PdfDeskError::MissingFile`]
    /// 2. missing `option` → [`PdfDeskError::MissingField`]; unrecognised
    ///    value → [`PdfDeskError::UnknownOperation`]
    /// 3. question answering with a missing or blank `user_query` →
    ///    [`PdfDeskError::MissingField`]
    pub fn validate(self) -> Result<Submission, PdfDeskError> {
        let pdf = match self.pdf_file {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(PdfDeskError::MissingFile),
        };

        let operation: Operation = self
            .option
            .as_deref()
            .ok_or(PdfDeskError::MissingField { field: "option" })?
            .parse()?;

        let query = self
            .user_query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        if operation.needs_query() && query.is_none() {
            return Err(PdfDeskError::MissingField {
                field: "user_query",
            });
        }

        Ok(Submission {
            operation,
            pdf,
            query,
        })
    }
}

/// The uploaded PDF, stored in a temp file for the lifetime of this value.
#[derive(Debug)]
pub struct UploadedDocument {
    path: TempPath,
    len: usize,
}

impl UploadedDocument {
    /// Write `bytes` to a fresh `.pdf` temp file in the system temp dir.
    pub fn persist(bytes: &[u8]) -> Result<Self, PdfDeskError> {
        Self::persist_in(&std::env::temp_dir(), bytes)
    }

    /// Write `bytes` to a fresh `.pdf` temp file inside `dir`.
    pub fn persist_in(dir: &Path, bytes: &[u8]) -> Result<Self, PdfDeskError> {
        check_magic(bytes)?;

        let mut file = tempfile::Builder::new()
            .prefix("pdfdesk-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(PdfDeskError::UploadFailed)?;
        file.write_all(bytes).map_err(PdfDeskError::UploadFailed)?;
        file.flush().map_err(PdfDeskError::UploadFailed)?;

        // Closes the handle; the path (and the file) stay alive.
        let path = file.into_temp_path();
        debug!("Stored upload ({} bytes) at {}", bytes.len(), path.display());

        Ok(Self {
            path,
            len: bytes.len(),
        })
    }

    /// Path of the temp file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the stored payload in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// `TempPath` removes the file on drop but swallows the error; removing it
// here first lets a failure show up in the logs.
impl Drop for UploadedDocument {
    fn drop(&mut self) {
        match std::fs::remove_file(&*self.path) {
            Ok(()) => debug!("Removed temp upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove temp upload {}: {}", self.path.display(), e),
        }
    }
}

fn check_magic(bytes: &[u8]) -> Result<(), PdfDeskError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(PdfDeskError::NotAPdf {
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}
