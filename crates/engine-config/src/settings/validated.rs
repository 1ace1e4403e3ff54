use crate::settings::{InvalidDocumentPolicy, UnavailableRangePolicy};
use chrono_tz::Tz;
use engine_core::retry::RetryPolicy;
use model::core::identifiers::CollectionRef;
use std::time::Duration;
use tracing::info;

/// Immutable, validated configuration handed to the scan orchestrator.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    /// Collection scanned when a request does not name one
    pub default_collection: Option<CollectionRef>,
    /// Number of partition key ranges read at the same time
    pub concurrency: usize,
    /// Requested feed page size, `None` for as many as available
    pub max_item_count: Option<usize>,
    /// Zone a local watermark is interpreted in
    pub reference_zone: Tz,
    pub retry: RetryPolicy,
    pub unavailable_range_policy: UnavailableRangePolicy,
    pub invalid_document_policy: InvalidDocumentPolicy,
    pub timeout: Option<Duration>,
}

impl Default for ValidatedSettings {
    fn default() -> Self {
        Self {
            default_collection: None,
            concurrency: 4,
            max_item_count: None,
            reference_zone: Tz::UTC,
            retry: RetryPolicy::for_store(),
            unavailable_range_policy: UnavailableRangePolicy::Skip,
            invalid_document_policy: InvalidDocumentPolicy::Skip,
            timeout: None,
        }
    }
}

impl ValidatedSettings {
    pub fn with_default_collection(mut self, collection: CollectionRef) -> Self {
        self.default_collection = Some(collection);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_unavailable_range_policy(mut self, policy: UnavailableRangePolicy) -> Self {
        self.unavailable_range_policy = policy;
        self
    }

    pub fn with_invalid_document_policy(mut self, policy: InvalidDocumentPolicy) -> Self {
        self.invalid_document_policy = policy;
        self
    }

    pub fn with_max_item_count(mut self, max_item_count: Option<usize>) -> Self {
        self.max_item_count = max_item_count;
        self
    }

    pub fn with_reference_zone(mut self, zone: Tz) -> Self {
        self.reference_zone = zone;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn log(&self) {
        info!("=== Scan Settings ===");
        match &self.default_collection {
            Some(coll) => info!("  Default collection: {}", coll),
            None => info!("  Default collection: <none>"),
        }
        info!("  Concurrency: {}", self.concurrency);
        info!("  Max item count: {:?}", self.max_item_count);
        info!("  Reference zone: {}", self.reference_zone);
        info!("  Retry attempts: {}", self.retry.max_attempts);
        info!("  Unavailable ranges: {:?}", self.unavailable_range_policy);
        info!("  Invalid documents: {:?}", self.invalid_document_policy);
        info!("  Timeout: {:?}", self.timeout);
        info!("=====================");
    }
}
