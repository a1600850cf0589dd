//! Progress reporting for batch runs.
//!
//! [`ProgressCallback`] keeps the orchestrator independent of how progress
//! is rendered. The CLI plugs in `indicatif` bars; tests and embedders that
//! don't care use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates while archives are processed.
///
/// Implementations must be `Send + Sync` because archive tasks report
/// concurrently.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of archives that will be processed.
    fn set_total(&self, total: u64);

    /// Marks `delta` more archives as finished.
    fn inc(&self, delta: u64);

    /// Updates the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
