use crate::{metrics::Metrics, retry::RetryPolicy};
use connectors::store::DocumentStore;
use model::core::identifiers::CollectionRef;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a single scan of one collection needs, shared by its range workers.
#[derive(Clone)]
pub struct ScanContext {
    pub scan_id: String,
    pub store: Arc<dyn DocumentStore>,
    pub collection: CollectionRef,
    pub retry: RetryPolicy,
    pub metrics: Metrics,
    pub cancel: CancellationToken,
    pub max_item_count: Option<usize>,
}

impl ScanContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: CollectionRef,
        retry: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        let metrics = Metrics::new();
        Self {
            scan_id: format!("scan-{}", uuid::Uuid::new_v4().simple()),
            store,
            collection,
            retry: retry.observed(metrics.clone()),
            metrics,
            cancel,
            max_item_count: None,
        }
    }

    pub fn with_max_item_count(mut self, max_item_count: Option<usize>) -> Self {
        self.max_item_count = max_item_count;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
