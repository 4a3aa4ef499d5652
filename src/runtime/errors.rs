//! Error types for the streaming runtime

use crossbeam_channel::{RecvError, SendError};

/// Why a unit of work could not complete
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    #[error("Edge stream receive failed: {0}")]
    RecvError(#[from] RecvError),

    #[error("Output stream send failed: {0}")]
    SendError(String),

    #[error("Node error: {0}")]
    NodeError(String),

    /// The shared stop signal was raised
    #[error("Stop requested")]
    Shutdown,

    /// An input stream has no more samples
    #[error("End of stream")]
    EndOfStream,
}

impl WorkError {
    /// Whether this error is a normal way for a worker to finish.
    pub fn is_termination(&self) -> bool {
        matches!(self, WorkError::Shutdown | WorkError::EndOfStream)
    }
}

impl<T> From<SendError<T>> for WorkError {
    fn from(e: SendError<T>) -> Self {
        WorkError::SendError(e.to_string())
    }
}

/// Result type for work functions
pub type WorkResult<T = ()> = Result<T, WorkError>;
