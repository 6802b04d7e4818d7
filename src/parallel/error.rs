use crossbeam_channel::SendError;
use thiserror::Error;

// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Error type for parallel processing operations
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Invalid number of threads specified
    #[error("Invalid thread count specified")]
    InvalidThreadCount,

    /// Error sending jobs to worker threads
    #[error("Channel error: {0}")]
    SendError(#[from] SendError<usize>),

    /// Error joining threads
    #[error("Thread join error.")]
    JoinError,

    /// Error reading from input
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from FASTX processing
    #[error("FASTX error: {0}")]
    FastxError(#[from] crate::Error),
}
