//! Progress-callback trait for pipeline checkpoints.
//!
//! Inject an [`Arc<dyn ParseProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to receive
//! coarse progress events as the pipeline advances.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` because the
//! engine stage runs on a spawned task.
//!
//! # Checkpoints
//!
//! The pipeline reports at three fixed fractions:
//!
//! | Fraction | Meaning |
//! |----------|---------|
//! | 0.10     | Input preprocessing started |
//! | 0.30     | PDF materialised, engine call about to start |
//! | 0.50     | Markdown and artifacts written (or: processing failed) |
//!
//! Fractions above 0.50 are reserved for the caller's own downstream stages
//! (indexing, embedding, …); this library never reports past 0.50.

use std::sync::Arc;

/// Called by the pipeline at fixed checkpoints.
///
/// The single method keeps the contract identical for success and failure
/// paths: on error the pipeline reports fraction 0.50 with a failure message
/// before returning `Err`.
pub trait ParseProgressCallback: Send + Sync {
    /// Called at each checkpoint.
    ///
    /// # Arguments
    /// * `fraction` — completed fraction of this library's share of the job (0.0–0.5)
    /// * `message`  — human-readable description of the checkpoint
    fn on_progress(&self, fraction: f32, message: &str) {
        let _ = (fraction, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ParseProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type ProgressCallback = Arc<dyn ParseProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingCallback {
        events: Mutex<Vec<(f32, String)>>,
    }

    impl ParseProgressCallback for RecordingCallback {
        fn on_progress(&self, fraction: f32, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push((fraction, message.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_progress(0.1, "preprocessing");
        cb.on_progress(0.5, "done");
    }

    #[test]
    fn recording_callback_receives_events_in_order() {
        let cb = RecordingCallback {
            events: Mutex::new(Vec::new()),
        };
        cb.on_progress(0.1, "preprocessing");
        cb.on_progress(0.3, "pdf ready");
        cb.on_progress(0.5, "markdown written");

        let events = cb.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].0, 0.1);
        assert_eq!(events[2].1, "markdown written");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ParseProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_progress(0.3, "pdf ready");
    }
}
