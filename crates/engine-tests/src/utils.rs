use async_trait::async_trait;
use connectors::{
    error::StoreError,
    memory::MemoryStore,
    store::{ChangeFeedOptions, DocumentStore, FeedCursor},
};
use engine_config::settings::validated::ValidatedSettings;
use engine_core::retry::RetryPolicy;
use engine_runtime::service::ChangeFeedService;
use model::{
    core::identifiers::{CollectionRef, RangeId},
    pagination::{continuation::ContinuationToken, page::Page},
    records::{outcome::ScanOutcome, range::PartitionKeyRange},
};
use serde_json::{Value, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

pub const DATABASE: &str = "fhir";
pub const COLLECTION: &str = "resources";

/// Fixture with two partitions: Patients at 100 and 200 plus an Observation
/// at 300 in range 0, and an old Patient at 50 in range 1.
pub const TWO_RANGE_FIXTURE: &str = r#"
{
    "databases": [{
        "id": "fhir",
        "collections": [{
            "id": "resources",
            "partitions": [
                {
                    "id": "0", "minInclusive": "", "maxExclusive": "7F",
                    "documents": [
                        {"id": "p-1", "resourceType": "Patient", "_ts": 100},
                        {"id": "p-2", "resourceType": "Patient", "_ts": 200},
                        {"id": "o-1", "resourceType": "Observation", "_ts": 300}
                    ]
                },
                {
                    "id": "1", "minInclusive": "7F", "maxExclusive": "FF",
                    "documents": [
                        {"id": "p-0", "resourceType": "Patient", "_ts": 50}
                    ]
                }
            ]
        }]
    }]
}
"#;

pub fn coll() -> CollectionRef {
    CollectionRef::new(DATABASE, COLLECTION)
}

pub fn doc(id: &str, resource_type: &str, ts: i64) -> Value {
    json!({"id": id, "resourceType": resource_type, "_ts": ts})
}

/// Settings pointing at the test collection with fast retries.
pub fn settings() -> ValidatedSettings {
    ValidatedSettings::default()
        .with_default_collection(coll())
        .with_retry(fast_retry())
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
}

/// One partition per entry, with range ids "0", "1", ...
pub fn store_with(partitions: Vec<Vec<Value>>) -> MemoryStore {
    let store = MemoryStore::new();
    for (i, documents) in partitions.into_iter().enumerate() {
        store.add_partition(
            &coll(),
            PartitionKeyRange::new(i.to_string(), format!("{i:02X}"), format!("{:02X}", i + 1)),
            documents,
        );
    }
    store
}

pub fn service(store: Arc<dyn DocumentStore>, settings: ValidatedSettings) -> ChangeFeedService {
    ChangeFeedService::new(store, settings, CancellationToken::new())
}

pub fn ids_of(outcome: &ScanOutcome) -> Vec<String> {
    outcome
        .documents()
        .iter()
        .filter_map(|d| d.id().map(str::to_string))
        .collect()
}

pub fn ts_of(outcome: &ScanOutcome) -> Vec<i64> {
    outcome.documents().iter().map(|d| d.ts).collect()
}

/// Wraps a store and records how many page fetches overlap in time.
#[derive(Clone)]
pub struct GaugeStore {
    inner: MemoryStore,
    fetch_delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl GaugeStore {
    pub fn new(inner: MemoryStore, fetch_delay: Duration) -> Self {
        Self {
            inner,
            fetch_delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest number of page fetches observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for GaugeStore {
    async fn list_partition_key_ranges(
        &self,
        collection: &CollectionRef,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<PartitionKeyRange>, StoreError> {
        self.inner
            .list_partition_key_ranges(collection, continuation)
            .await
    }

    async fn open_change_feed(
        &self,
        collection: &CollectionRef,
        options: &ChangeFeedOptions,
    ) -> Result<Option<Box<dyn FeedCursor>>, StoreError> {
        let cursor = self.inner.open_change_feed(collection, options).await?;
        Ok(cursor.map(|inner| {
            Box::new(GaugeCursor {
                inner,
                store: self.clone(),
            }) as Box<dyn FeedCursor>
        }))
    }
}

struct GaugeCursor {
    inner: Box<dyn FeedCursor>,
    store: GaugeStore,
}

#[async_trait]
impl FeedCursor for GaugeCursor {
    fn has_more_results(&self) -> bool {
        self.inner.has_more_results()
    }

    async fn fetch_next_page(&mut self) -> Result<Page<Value>, StoreError> {
        let now = self.store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.store.fetch_delay).await;
        let page = self.inner.fetch_next_page().await;

        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
        page
    }
}

/// Wraps a store whose listed ranges have split: opening their feeds fails
/// the way a real store answers for a range that no longer exists.
#[derive(Clone)]
pub struct SplitStore {
    inner: MemoryStore,
    split: Vec<RangeId>,
}

impl SplitStore {
    pub fn new(inner: MemoryStore, split: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            inner,
            split: split.into_iter().map(RangeId::from).collect(),
        }
    }
}

#[async_trait]
impl DocumentStore for SplitStore {
    async fn list_partition_key_ranges(
        &self,
        collection: &CollectionRef,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<PartitionKeyRange>, StoreError> {
        self.inner
            .list_partition_key_ranges(collection, continuation)
            .await
    }

    async fn open_change_feed(
        &self,
        collection: &CollectionRef,
        options: &ChangeFeedOptions,
    ) -> Result<Option<Box<dyn FeedCursor>>, StoreError> {
        if self.split.contains(&options.partition_key_range_id) {
            return Err(StoreError::Generic(format!(
                "410 Gone: partition key range {} has split",
                options.partition_key_range_id
            )));
        }
        self.inner.open_change_feed(collection, options).await
    }
}
