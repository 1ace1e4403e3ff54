use crate::{error::EnumerationError, retry::classify_store_error};
use async_trait::async_trait;
use connectors::{error::StoreError, store::DocumentStore};
use engine_core::{
    context::scan::ScanContext,
    retry::{RetryError, RetryPolicy},
};
use model::{
    core::identifiers::CollectionRef,
    pagination::{
        continuation::ContinuationToken,
        page::Page,
        paginator::{Paginator, drain},
    },
    records::range::PartitionKeyRange,
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

/// Pages through a collection's partition key ranges, retrying transient
/// store failures on each page.
pub struct RangeListing {
    store: Arc<dyn DocumentStore>,
    collection: CollectionRef,
    retry: RetryPolicy,
    continuation: Option<ContinuationToken>,
    started: bool,
    pages: usize,
}

impl RangeListing {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: CollectionRef,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            collection,
            retry,
            continuation: None,
            started: false,
            pages: 0,
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }
}

#[async_trait]
impl Paginator for RangeListing {
    type Item = PartitionKeyRange;
    type Error = RetryError<StoreError>;

    fn has_next(&self) -> bool {
        !self.started || self.continuation.is_some()
    }

    async fn next_page(&mut self) -> Result<Page<PartitionKeyRange>, Self::Error> {
        let store = self.store.clone();
        let collection = self.collection.clone();
        let token = self.continuation.clone();

        let page = self
            .retry
            .run(
                || {
                    let store = store.clone();
                    let collection = collection.clone();
                    let token = token.clone();
                    async move {
                        store
                            .list_partition_key_ranges(&collection, token.as_ref())
                            .await
                    }
                },
                classify_store_error,
            )
            .await?;

        self.started = true;
        self.pages += 1;
        self.continuation = page.continuation.clone();

        debug!(
            page = self.pages,
            ranges = page.len(),
            more = self.continuation.is_some(),
            "Fetched partition key range page."
        );

        Ok(page)
    }
}

/// Lists every partition key range of the scanned collection.
///
/// Follows continuation tokens until the store stops returning one. An empty
/// listing is an error, distinct from a scan that matches nothing.
pub async fn list_all_ranges(ctx: &ScanContext) -> Result<Vec<PartitionKeyRange>, EnumerationError> {
    let mut listing = RangeListing::new(
        ctx.store.clone(),
        ctx.collection.clone(),
        ctx.retry.clone(),
    );
    let collection = ctx.collection.link();

    let listed = drain(&mut listing).await.map_err(|e| match e {
        RetryError::Fatal(source) => EnumerationError::Store {
            collection: collection.clone(),
            source,
        },
        RetryError::AttemptsExceeded { attempts, last } => EnumerationError::RetriesExhausted {
            collection: collection.clone(),
            attempts,
            source: last,
        },
    })?;

    let mut seen = HashSet::new();
    let mut ranges = Vec::with_capacity(listed.len());
    for range in listed {
        if seen.insert(range.id.clone()) {
            ranges.push(range);
        } else {
            warn!(range_id = %range.id, "Partition key range listed twice; ignoring duplicate.");
        }
    }

    if ranges.is_empty() {
        return Err(EnumerationError::NoRanges(collection));
    }

    ctx.metrics.increment_ranges(ranges.len() as u64);
    info!(
        collection = %collection,
        ranges = ranges.len(),
        pages = listing.pages(),
        "Enumerated partition key ranges."
    );

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::{FaultPlan, MemoryStore};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn coll() -> CollectionRef {
        CollectionRef::new("fhir", "resources")
    }

    fn ctx(store: MemoryStore) -> ScanContext {
        ScanContext::new(
            Arc::new(store),
            coll(),
            RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2)),
            CancellationToken::new(),
        )
    }

    fn store_with(range_count: usize, page_size: usize) -> MemoryStore {
        let store = MemoryStore::new().with_range_page_size(page_size);
        for i in 0..range_count {
            store.add_partition(&coll(), PartitionKeyRange::new(i.to_string(), "", ""), vec![]);
        }
        store
    }

    #[tokio::test]
    async fn test_follows_every_continuation() {
        let store = store_with(7, 2);
        let ranges = list_all_ranges(&ctx(store.clone())).await.unwrap();

        let ids: Vec<&str> = ranges.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6"]);
        assert_eq!(store.listing_calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_listing_is_an_error() {
        let store = MemoryStore::new();
        store.create_collection(&coll());

        let err = list_all_ranges(&ctx(store)).await.unwrap_err();
        assert!(matches!(err, EnumerationError::NoRanges(_)));
    }

    #[tokio::test]
    async fn test_failure_on_later_page_aborts_without_partial_list() {
        let store = store_with(5, 2).with_faults(FaultPlan {
            fail_listing_at_page: Some(2),
            ..Default::default()
        });

        let err = list_all_ranges(&ctx(store)).await.unwrap_err();
        assert!(matches!(err, EnumerationError::Store { .. }));
    }

    #[tokio::test]
    async fn test_transient_listing_failures_are_retried() {
        let store = store_with(3, 1).with_faults(FaultPlan {
            transient_listing_failures: 2,
            ..Default::default()
        });
        let ctx = ctx(store.clone());

        let ranges = list_all_ranges(&ctx).await.unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(store.listing_calls(), 5);
        assert_eq!(ctx.metrics.snapshot().retry_count, 2);
        assert_eq!(ctx.metrics.snapshot().ranges_listed, 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let store = store_with(3, 1).with_faults(FaultPlan {
            transient_listing_failures: 10,
            ..Default::default()
        });

        let err = list_all_ranges(&ctx(store)).await.unwrap_err();
        assert!(matches!(
            err,
            EnumerationError::RetriesExhausted { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let err = list_all_ranges(&ctx(MemoryStore::new())).await.unwrap_err();
        assert!(matches!(
            err,
            EnumerationError::Store {
                source: StoreError::CollectionNotFound(_),
                ..
            }
        ));
    }
}
