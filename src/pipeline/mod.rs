//! Request pipeline stages.
//!
//! Each submodule implements exactly one step so it can be tested on its
//! own and swapped without touching its neighbours.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ chunk ──▶ dispatch ──▶ render
//! (temp .pdf)  (pdfium)   (fixed width) (pipelines)  (askama)
//! ```
//!
//! 1. [`upload`]  — validate the form and persist the PDF to a request-scoped
//!    temp file that is removed when the request ends, on every path
//! 2. [`extract`] — turn the PDF into one string, pages joined by spaces; runs
//!    in `spawn_blocking` because pdfium is synchronous
//! 3. [`chunk`]   — split text into fixed-width, gap-free, non-overlapping
//!    slices for the pipelines with small input windows
//!
//! Dispatch and rendering live in [`crate::dispatch`] and [`crate::render`].

pub mod chunk;
pub mod extract;
pub mod upload;
