use thiserror::Error;

/// Errors surfaced by a document store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection link does not resolve to a collection.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// The store rejected the request because of its rate limits.
    #[error("Request throttled, retry after {retry_after_ms} ms")]
    Throttled { retry_after_ms: u64 },

    /// The request timed out before the store answered.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A failure the store reports as safe to retry.
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// The continuation token handed back is not one this store issued.
    #[error("Invalid continuation token: {0}")]
    InvalidContinuation(String),

    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be decoded.
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic store error.
    #[error("Store error: {0}")]
    Generic(String),
}

impl StoreError {
    /// Whether the same request may succeed if issued again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Throttled { .. }
                | StoreError::Timeout(_)
                | StoreError::Transient(_)
                | StoreError::Io(_)
        )
    }
}
