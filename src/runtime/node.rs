//! The unit of work the scheduler runs

pub use super::errors::{WorkError, WorkResult};

/// A streaming worker driven by the [`Scheduler`](super::Scheduler).
///
/// A node owns its input cursors and its output sink. The scheduler gives it a
/// thread and calls [`work`](Self::work) until it asks to stop, fails, or the
/// shared stop signal is raised.
pub trait ProcessNode: Send {
    fn name(&self) -> &str;

    /// Checked before every `work()` call
    fn should_stop(&self) -> bool {
        false
    }

    /// Advance by one step. Returns the number of items produced.
    ///
    /// `WorkError::Shutdown` and `WorkError::EndOfStream` end the worker
    /// quietly; any other error is logged.
    fn work(&mut self) -> WorkResult<usize>;
}
