//! Progress-callback trait for per-chunk dispatch events.
//!
//! The chunked operations (translation, question generation) can take a
//! while on long documents. The dispatcher reports each step to an
//! [`Arc<dyn ChunkProgressCallback>`]; the default, [`TracingProgress`],
//! turns them into `tracing` lines on the console.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfdesk::{ChunkProgressCallback, Operation};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl ChunkProgressCallback for Counter {
//!     fn on_chunk_complete(&self, _op: Operation, _chunk: usize, _total: usize, _len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::operation::Operation;
use std::sync::Arc;
use tracing::{info, warn};

/// Receives dispatch events. All methods default to no-ops.
///
/// Chunks are dispatched strictly one after another, but a single callback
/// is shared by every request the server handles, so implementations must
/// still be `Send + Sync`.
pub trait ChunkProgressCallback: Send + Sync {
    /// Called once the chunk count is known, before the first call.
    fn on_operation_start(&self, operation: Operation, total_chunks: usize) {
        let _ = (operation, total_chunks);
    }

    /// Called just before chunk `chunk` (1-indexed) is sent.
    fn on_chunk_start(&self, operation: Operation, chunk: usize, total_chunks: usize) {
        let _ = (operation, chunk, total_chunks);
    }

    /// Called when a chunk returns successfully.
    ///
    /// `output_len` is the byte length of the pipeline output for the chunk.
    fn on_chunk_complete(
        &self,
        operation: Operation,
        chunk: usize,
        total_chunks: usize,
        output_len: usize,
    ) {
        let _ = (operation, chunk, total_chunks, output_len);
    }

    /// Called when a chunk fails. No further chunks follow.
    fn on_chunk_error(&self, operation: Operation, chunk: usize, total_chunks: usize, error: &str) {
        let _ = (operation, chunk, total_chunks, error);
    }

    /// Called after the last chunk succeeded.
    fn on_operation_complete(&self, operation: Operation, total_chunks: usize) {
        let _ = (operation, total_chunks);
    }
}

/// Ignores every event.
pub struct NoopProgressCallback;

impl ChunkProgressCallback for NoopProgressCallback {}

/// Logs chunk progress through `tracing`. This is the dispatcher default.
pub struct TracingProgress;

impl ChunkProgressCallback for TracingProgress {
    fn on_operation_start(&self, operation: Operation, total_chunks: usize) {
        info!("{}: {} chunk(s) to process", operation, total_chunks);
    }

    fn on_chunk_start(&self, operation: Operation, chunk: usize, total_chunks: usize) {
        let verb = match operation {
            Operation::Translate => "Translating",
            _ => "Processing",
        };
        info!("{} chunk {}/{}...", verb, chunk, total_chunks);
    }

    fn on_chunk_error(&self, operation: Operation, chunk: usize, total_chunks: usize, error: &str) {
        warn!(
            "{}: chunk {}/{} failed, aborting: {}",
            operation, chunk, total_chunks, error
        );
    }
}

/// Alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn ChunkProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        total: AtomicUsize,
    }

    impl ChunkProgressCallback for TrackingCallback {
        fn on_operation_start(&self, _op: Operation, total_chunks: usize) {
            self.total.store(total_chunks, Ordering::SeqCst);
        }

        fn on_chunk_start(&self, _op: Operation, _chunk: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _op: Operation, _chunk: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_error(&self, _op: Operation, _chunk: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_callbacks_do_not_panic() {
        for cb in [
            Arc::new(NoopProgressCallback) as ProgressCallback,
            Arc::new(TracingProgress) as ProgressCallback,
        ] {
            cb.on_operation_start(Operation::Translate, 3);
            cb.on_chunk_start(Operation::Translate, 1, 3);
            cb.on_chunk_complete(Operation::Translate, 1, 3, 42);
            cb.on_chunk_error(Operation::Translate, 2, 3, "boom");
            cb.on_operation_complete(Operation::GenerateQuestions, 0);
        }
    }

    #[test]
    fn tracking_callback_receives_events() {
        let t = TrackingCallback::default();
        t.on_operation_start(Operation::GenerateQuestions, 2);
        t.on_chunk_start(Operation::GenerateQuestions, 1, 2);
        t.on_chunk_complete(Operation::GenerateQuestions, 1, 2, 10);
        t.on_chunk_start(Operation::GenerateQuestions, 2, 2);
        t.on_chunk_error(Operation::GenerateQuestions, 2, 2, "timeout");

        assert_eq!(t.total.load(Ordering::SeqCst), 2);
        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
    }
}
