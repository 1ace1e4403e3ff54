use connectors::error::StoreError;
use model::{core::identifiers::RangeId, records::document::DocumentError};
use thiserror::Error;

/// Failure to build the list of partition key ranges. Always fatal for a scan.
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("Failed to list partition key ranges of {collection}: {source}")]
    Store {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("Listing partition key ranges of {collection} gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        collection: String,
        attempts: usize,
        #[source]
        source: StoreError,
    },

    #[error("Collection {0} reported no partition key ranges")]
    NoRanges(String),
}

#[derive(Error, Debug)]
pub enum ReaderError {
    /// The store has no change feed for the range, e.g. after a split.
    #[error("Change feed unavailable for partition key range {0}")]
    FeedUnavailable(RangeId),

    #[error("Failed to open change feed of range {range_id}: {source}")]
    Open {
        range_id: RangeId,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read page {page} of range {range_id}: {source}")]
    Fetch {
        range_id: RangeId,
        page: u64,
        #[source]
        source: StoreError,
    },

    #[error("Invalid document in range {range_id}: {source}")]
    InvalidDocument {
        range_id: RangeId,
        #[source]
        source: DocumentError,
    },
}

impl ReaderError {
    pub fn range_id(&self) -> &RangeId {
        match self {
            ReaderError::FeedUnavailable(range_id)
            | ReaderError::Open { range_id, .. }
            | ReaderError::Fetch { range_id, .. }
            | ReaderError::InvalidDocument { range_id, .. } => range_id,
        }
    }

    /// Whether the range should be reported as not found instead of failing
    /// the scan.
    ///
    /// A store signals a split or a vanished range either with no cursor or
    /// with an error on open. A rejected resume token is the caller's
    /// mistake and stays an error.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ReaderError::FeedUnavailable(_) => true,
            ReaderError::Open { source, .. } => {
                !matches!(source, StoreError::InvalidContinuation(_))
            }
            ReaderError::Fetch { .. } | ReaderError::InvalidDocument { .. } => false,
        }
    }
}
