//! Error types for streaming pipeline runs.

use std::io;

use thiserror::Error;

/// Boxed error produced by a row source implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The single error a pipeline run reports.
///
/// Every variant is terminal for the run. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The row source could not be opened or the query could not be prepared.
    #[error("row source unavailable: {0}")]
    SourceOpen(#[source] BoxError),

    /// A row failed to fetch or decode.
    #[error("failed to read row {row}: {source}")]
    SourceRead {
        /// Zero-based index of the failing row.
        row: u64,
        #[source]
        source: BoxError,
    },

    /// Output could not be written to the sink.
    #[error("failed to write output: {0}")]
    SinkWrite(#[from] io::Error),

    /// Malformed template or a field-count mismatch during substitution.
    #[error("render error: {0}")]
    Render(String),

    /// The cancellation token was set or its deadline elapsed.
    #[error("pipeline run cancelled")]
    Cancelled,

    /// The other side of the channel failed and stopped the stream.
    #[error("row stream aborted")]
    StreamAborted,

    /// A pipeline thread panicked.
    #[error("{task} task panicked: {message}")]
    TaskPanicked { task: &'static str, message: String },
}

impl PipelineError {
    pub fn source_open(err: impl Into<BoxError>) -> Self {
        Self::SourceOpen(err.into())
    }

    pub fn source_read(row: u64, err: impl Into<BoxError>) -> Self {
        Self::SourceRead {
            row,
            source: err.into(),
        }
    }

    /// True for errors that only echo a failure on the other side of the
    /// channel.
    pub fn is_echo(&self) -> bool {
        matches!(self, Self::StreamAborted)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
