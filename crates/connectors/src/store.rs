use crate::error::StoreError;
use async_trait::async_trait;
use model::{
    core::identifiers::{CollectionRef, RangeId},
    pagination::{continuation::ContinuationToken, page::Page},
    records::range::PartitionKeyRange,
};
use serde_json::Value;

/// Options for opening a change feed on one partition key range.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFeedOptions {
    pub partition_key_range_id: RangeId,
    pub start_from_beginning: bool,
    pub request_continuation: Option<ContinuationToken>,
    /// Maximum documents per page; `None` asks for as many as available.
    pub max_item_count: Option<usize>,
}

impl ChangeFeedOptions {
    /// Read the whole history of the range.
    pub fn from_beginning(range_id: RangeId) -> Self {
        Self {
            partition_key_range_id: range_id,
            start_from_beginning: true,
            request_continuation: None,
            max_item_count: None,
        }
    }

    /// Pick up where an earlier read of the range stopped.
    pub fn resume(range_id: RangeId, continuation: ContinuationToken) -> Self {
        Self {
            partition_key_range_id: range_id,
            start_from_beginning: false,
            request_continuation: Some(continuation),
            max_item_count: None,
        }
    }

    pub fn with_max_item_count(mut self, max_item_count: Option<usize>) -> Self {
        self.max_item_count = max_item_count;
        self
    }
}

/// An open change feed on a single partition key range.
#[async_trait]
pub trait FeedCursor: Send {
    /// `true` until a fetched page reports the end of the feed.
    fn has_more_results(&self) -> bool;

    /// Fetches the next page of raw documents.
    async fn fetch_next_page(&mut self) -> Result<Page<Value>, StoreError>;
}

/// The document store the scanner reads from.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists one page of the collection's partition key ranges.
    async fn list_partition_key_ranges(
        &self,
        collection: &CollectionRef,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<PartitionKeyRange>, StoreError>;

    /// Opens a change feed; `None` means the range has no readable feed.
    async fn open_change_feed(
        &self,
        collection: &CollectionRef,
        options: &ChangeFeedOptions,
    ) -> Result<Option<Box<dyn FeedCursor>>, StoreError>;
}
