use crate::{
    error::ScanError,
    execution::{
        executor::ScanExecutor,
        request::{ScanRequest, ScanResult},
    },
};
use connectors::store::DocumentStore;
use engine_config::settings::validated::ValidatedSettings;
use model::{
    core::{identifiers::CollectionRef, watermark::Watermark},
    records::{outcome::ScanOutcome, range::PartitionKeyRange},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Service boundary for "new or modified since" queries against one store.
///
/// Every call is an independent read of the full feed history; nothing is
/// cached between calls.
pub struct ChangeFeedService {
    executor: ScanExecutor,
    cancel: CancellationToken,
}

impl ChangeFeedService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: ValidatedSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            executor: ScanExecutor::new(store, settings),
            cancel,
        }
    }

    /// Documents of `resource_type` created or modified at or after `since`.
    ///
    /// `collection` falls back to the configured default. Without `since`
    /// every document of the resource type is returned.
    pub async fn get_new_or_modified_documents(
        &self,
        collection: Option<CollectionRef>,
        resource_type: &str,
        since: Option<Watermark>,
    ) -> Result<ScanOutcome, ScanError> {
        let mut request = ScanRequest::new(resource_type);
        request.collection = collection;
        request.since = since;

        Ok(self.scan(request).await?.outcome)
    }

    /// Runs a full request and returns the per-range report with the outcome.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanResult, ScanError> {
        self.executor.execute(request, self.cancel.clone()).await
    }

    pub async fn list_ranges(
        &self,
        collection: Option<CollectionRef>,
    ) -> Result<Vec<PartitionKeyRange>, ScanError> {
        self.executor.list_ranges(collection, self.cancel.clone()).await
    }

    pub fn settings(&self) -> &ValidatedSettings {
        self.executor.settings()
    }
}
