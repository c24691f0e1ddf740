//! Progress reporting for batch runs.
//!
//! The batch runner only talks to [`ProgressCallback`]; binaries plug in a
//! terminal progress bar and tests use [`NullProgress`].

/// Receives progress updates while file groups are processed.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of file groups in the batch.
    fn set_total(&self, total: u64);

    /// Advances by `delta` finished groups.
    fn inc(&self, delta: u64);

    /// Shows which group is being worked on.
    fn set_message(&self, msg: String);

    /// Marks the batch as done and leaves `msg` on screen.
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
