//! Output sink port interface

use std::path::Path;

use thiserror::Error;

/// Output errors
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("Failed to open output {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Failed to write output {path}: {message}")]
    WriteFailed { path: String, message: String },
}

/// Port for ordered, append-only byte persistence
pub trait OutputSink: Send {
    /// Append bytes after everything written so far. Empty input is a no-op.
    fn append(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Total bytes appended in this session
    fn bytes_written(&self) -> u64;

    /// Where the stream is written
    fn path(&self) -> &Path;
}
