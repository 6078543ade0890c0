//! Text extraction: PDF file → one string, pages joined by single spaces.
//!
//! The actual PDF parsing is an external capability behind the
//! [`DocumentLoader`] trait. The production loader, [`PdfiumLoader`], binds
//! the pdfium C++ library through `pdfium-render`; pdfium is synchronous and
//! keeps thread-local state, so [`extract_text`] always runs the loader
//! inside `spawn_blocking`.

use crate::config::DeskConfig;
use crate::error::PdfDeskError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Parses a document into per-page text, in page order.
pub trait DocumentLoader: Send + Sync {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, PdfDeskError>;
}

/// Extract the full text of the document at `path`.
///
/// Page texts are joined with a single space. A document without pages
/// yields an empty string.
pub async fn extract_text(
    loader: Arc<dyn DocumentLoader>,
    path: &Path,
) -> Result<String, PdfDeskError> {
    let path = path.to_path_buf();
    let start = Instant::now();

    let pages = tokio::task::spawn_blocking(move || loader.load_pages(&path))
        .await
        .map_err(|e| PdfDeskError::Internal(format!("Extraction task panicked: {}", e)))??;

    let text = join_pages(&pages);
    info!(
        "Extracted {} pages, {} chars in {}ms",
        pages.len(),
        text.chars().count(),
        start.elapsed().as_millis()
    );
    Ok(text)
}

/// Join page texts with single spaces.
pub fn join_pages(pages: &[String]) -> String {
    pages.join(" ")
}

/// [`DocumentLoader`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumLoader {
    library: PathBuf,
}

impl PdfiumLoader {
    /// Use the pdfium library at `library`.
    pub fn new(library: impl Into<PathBuf>) -> Self {
        Self {
            library: library.into(),
        }
    }

    /// Resolve a pdfium library via `pdfium-auto`, downloading it if needed.
    ///
    /// Blocking: call from `spawn_blocking` / `block_in_place` in async code.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, PdfDeskError> {
        let library = pdfium_auto::locate(explicit, None)
            .map_err(|e| PdfDeskError::PdfiumBindingFailed(e.to_string()))?;
        info!("Using pdfium at {}", library.display());
        Ok(Self::new(library))
    }

    /// Resolve the library named by `config.pdfium_lib_path`, falling back
    /// to the usual `pdfium-auto` lookup when it is unset or missing.
    pub fn from_config(config: &DeskConfig) -> Result<Self, PdfDeskError> {
        Self::locate(config.pdfium_lib_path.as_deref())
    }

    /// Path of the bound library.
    pub fn library(&self) -> &Path {
        &self.library
    }
}

impl DocumentLoader for PdfiumLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, PdfDeskError> {
        let pdfium = pdfium_auto::bind_pdfium_from_path(&self.library)
            .map_err(|e| PdfDeskError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| classify_load_error(format!("{:?}", e)))?;

        let pages = document.pages();
        let mut texts = Vec::with_capacity(pages.len() as usize);

        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| PdfDeskError::DocumentParse {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
            let content = text.all();
            debug!("Page {}: {} chars", idx + 1, content.len());
            texts.push(content);
        }

        Ok(texts)
    }
}

/// Map a pdfium load failure onto the user-facing taxonomy.
fn classify_load_error(detail: String) -> PdfDeskError {
    if detail.to_lowercase().contains("password") {
        PdfDeskError::PasswordRequired
    } else {
        PdfDeskError::DocumentParse { detail }
    }
}
