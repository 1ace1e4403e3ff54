use engine_processing::error::{EnumerationError, ReaderError};
use model::core::watermark::WatermarkError;
use std::time::Duration;
use thiserror::Error;

/// Top-level errors of a change feed scan.
///
/// None of these carry partial results: a scan either returns its outcome
/// or one of these.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The request itself was unusable, e.g. an empty resource type.
    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),

    /// The watermark could not be turned into epoch seconds. Raised before any I/O.
    #[error("Timestamp conversion error: {0}")]
    TimestampConversion(#[from] WatermarkError),

    #[error("Range enumeration error: {0}")]
    RangeEnumeration(#[from] EnumerationError),

    /// A range's feed failed after it was opened, or could not be opened for
    /// a reason other than being unavailable.
    #[error("Feed error: {0}")]
    Feed(#[from] ReaderError),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan timed out after {0:?}")]
    TimedOut(Duration),

    /// A range worker task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
