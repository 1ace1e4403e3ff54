use connectors::error::StoreError;
use engine_core::retry::RetryDisposition;
use std::time::Duration;

pub fn classify_store_error(err: &StoreError) -> RetryDisposition {
    match err {
        StoreError::Throttled { retry_after_ms } => {
            RetryDisposition::RetryAfter(Duration::from_millis(*retry_after_ms))
        }
        StoreError::Timeout(_) | StoreError::Transient(_) | StoreError::Io(_) => {
            RetryDisposition::Retry
        }
        StoreError::CollectionNotFound(_) => RetryDisposition::Stop,
        StoreError::InvalidContinuation(_) => RetryDisposition::Stop,
        StoreError::Json(_) => RetryDisposition::Stop,
        StoreError::Generic(_) => RetryDisposition::Stop,
    }
}
