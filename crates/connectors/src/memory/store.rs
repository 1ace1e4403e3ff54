use super::{
    cursor::MemoryFeedCursor,
    faults::{FaultPlan, FaultState},
};
use crate::{
    error::StoreError,
    store::{ChangeFeedOptions, DocumentStore, FeedCursor},
};
use async_trait::async_trait;
use model::{
    core::identifiers::{CollectionRef, RangeId},
    pagination::{continuation::ContinuationToken, page::Page},
    records::{document::ID_FIELD, range::PartitionKeyRange},
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, atomic::Ordering},
};
use tracing::debug;

const DEFAULT_FEED_PAGE_SIZE: usize = 100;
const DEFAULT_RANGE_PAGE_SIZE: usize = 1000;
const RANGE_TOKEN_PREFIX: &str = "ranges-";

#[derive(Debug, Clone)]
struct MemoryPartition {
    range: PartitionKeyRange,
    feed: Arc<Vec<Value>>,
    available: bool,
}

type Collections = HashMap<String, Vec<MemoryPartition>>;

/// In-process document store keeping one append-only change feed per
/// partition key range.
///
/// Page sizes are deliberately configurable so that both the range listing
/// and the feeds can be forced across many pages.
#[derive(Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    feed_page_size: usize,
    range_page_size: usize,
    faults: Arc<FaultState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            feed_page_size: DEFAULT_FEED_PAGE_SIZE,
            range_page_size: DEFAULT_RANGE_PAGE_SIZE,
            faults: Arc::new(FaultState::default()),
        }
    }

    /// Largest page served when the reader asks for "as many as available".
    pub fn with_feed_page_size(mut self, size: usize) -> Self {
        self.feed_page_size = size.max(1);
        self
    }

    pub fn with_range_page_size(mut self, size: usize) -> Self {
        self.range_page_size = size.max(1);
        self
    }

    pub fn with_faults(mut self, plan: FaultPlan) -> Self {
        self.faults = Arc::new(FaultState::new(plan));
        self
    }

    /// Creates an empty collection; existing collections are left untouched.
    pub fn create_collection(&self, collection: &CollectionRef) {
        self.write().entry(collection.link()).or_default();
    }

    /// Adds a partition key range with an initial change feed.
    pub fn add_partition(
        &self,
        collection: &CollectionRef,
        range: PartitionKeyRange,
        documents: Vec<Value>,
    ) {
        let mut collections = self.write();
        let partitions = collections.entry(collection.link()).or_default();
        partitions.retain(|p| p.range.id != range.id);
        partitions.push(MemoryPartition {
            range,
            feed: Arc::new(documents),
            available: true,
        });
    }

    /// Writes a document to a range's feed.
    ///
    /// A document whose `id` already appears in the feed is moved to the end,
    /// so the feed only carries the latest version of each document.
    pub fn upsert_document(
        &self,
        collection: &CollectionRef,
        range_id: &RangeId,
        document: Value,
    ) -> Result<(), StoreError> {
        let mut collections = self.write();
        let partition = collections
            .get_mut(&collection.link())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.link()))?
            .iter_mut()
            .find(|p| &p.range.id == range_id)
            .ok_or_else(|| StoreError::Generic(format!("unknown partition key range {range_id}")))?;

        let feed = Arc::make_mut(&mut partition.feed);
        if let Some(id) = document.get(ID_FIELD).cloned() {
            feed.retain(|existing| existing.get(ID_FIELD) != Some(&id));
        }
        feed.push(document);
        Ok(())
    }

    /// Makes a range's feed unopenable, as after a split or a failover.
    pub fn set_available(&self, collection: &CollectionRef, range_id: &RangeId, available: bool) {
        if let Some(partitions) = self.write().get_mut(&collection.link()) {
            for partition in partitions.iter_mut().filter(|p| &p.range.id == range_id) {
                partition.available = available;
            }
        }
    }

    pub fn listing_calls(&self) -> usize {
        self.faults.listing_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.faults.open_calls.load(Ordering::SeqCst)
    }

    pub fn page_fetches(&self) -> usize {
        self.faults.page_fetches.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn range_offset(token: Option<&ContinuationToken>) -> Result<usize, StoreError> {
        match token {
            None => Ok(0),
            Some(token) => token
                .as_str()
                .strip_prefix(RANGE_TOKEN_PREFIX)
                .and_then(|offset| offset.parse().ok())
                .ok_or_else(|| StoreError::InvalidContinuation(token.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_partition_key_ranges(
        &self,
        collection: &CollectionRef,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<PartitionKeyRange>, StoreError> {
        let offset = Self::range_offset(continuation)?;
        self.faults.check_listing(offset / self.range_page_size)?;

        let collections = self.read();
        let partitions = collections
            .get(&collection.link())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.link()))?;

        if offset > partitions.len() {
            return Err(StoreError::InvalidContinuation(format!(
                "{RANGE_TOKEN_PREFIX}{offset}"
            )));
        }

        let end = offset.saturating_add(self.range_page_size).min(partitions.len());
        let ranges = partitions[offset..end]
            .iter()
            .map(|p| p.range.clone())
            .collect::<Vec<_>>();

        debug!(
            collection = %collection,
            offset,
            returned = ranges.len(),
            "Listed partition key ranges."
        );

        if end < partitions.len() {
            Ok(Page::with_continuation(
                ranges,
                ContinuationToken::new(format!("{RANGE_TOKEN_PREFIX}{end}")),
            ))
        } else {
            Ok(Page::last(ranges))
        }
    }

    async fn open_change_feed(
        &self,
        collection: &CollectionRef,
        options: &ChangeFeedOptions,
    ) -> Result<Option<Box<dyn FeedCursor>>, StoreError> {
        self.faults.open_calls.fetch_add(1, Ordering::SeqCst);

        let collections = self.read();
        let Some(partition) = collections.get(&collection.link()).and_then(|partitions| {
            partitions
                .iter()
                .find(|p| p.range.id == options.partition_key_range_id)
        }) else {
            return Ok(None);
        };

        if !partition.available {
            return Ok(None);
        }

        let feed = partition.feed.clone();
        let position = match &options.request_continuation {
            Some(token) => MemoryFeedCursor::parse_token(token)
                .filter(|pos| *pos <= feed.len())
                .ok_or_else(|| StoreError::InvalidContinuation(token.to_string()))?,
            None if options.start_from_beginning => 0,
            None => feed.len(),
        };

        let page_size = options.max_item_count.unwrap_or(self.feed_page_size);
        let cursor = MemoryFeedCursor::new(feed, position, page_size, self.faults.clone());
        Ok(Some(Box::new(cursor)))
    }
}
