//! Progress reporting for scrape runs.
//!
//! The scrape loop reports through [`ProgressCallback`] so it stays
//! independent of any rendering backend; the CLI plugs in `indicatif` bars
//! and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a scrape run.
///
/// Implementations must be `Send + Sync` so a callback can be shared with
/// the fetch futures.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of pages to fetch.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` pages.
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
