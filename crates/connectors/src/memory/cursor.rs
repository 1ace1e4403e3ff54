use super::faults::FaultState;
use crate::{error::StoreError, store::FeedCursor};
use async_trait::async_trait;
use model::pagination::{continuation::ContinuationToken, page::Page};
use serde_json::Value;
use std::sync::Arc;

/// Cursor over a snapshot of one partition's change feed.
pub struct MemoryFeedCursor {
    feed: Arc<Vec<Value>>,
    position: usize,
    page_size: usize,
    has_more: bool,
    faults: Arc<FaultState>,
}

impl MemoryFeedCursor {
    pub(crate) fn new(
        feed: Arc<Vec<Value>>,
        position: usize,
        page_size: usize,
        faults: Arc<FaultState>,
    ) -> Self {
        Self {
            feed,
            position,
            page_size: page_size.max(1),
            has_more: true,
            faults,
        }
    }

    pub(crate) fn token_for(position: usize) -> ContinuationToken {
        ContinuationToken::new(format!("lsn-{position}"))
    }

    pub(crate) fn parse_token(token: &ContinuationToken) -> Option<usize> {
        token.as_str().strip_prefix("lsn-")?.parse().ok()
    }
}

#[async_trait]
impl FeedCursor for MemoryFeedCursor {
    fn has_more_results(&self) -> bool {
        self.has_more
    }

    async fn fetch_next_page(&mut self) -> Result<Page<Value>, StoreError> {
        self.faults.check_page_fetch().await?;

        let end = self.position.saturating_add(self.page_size).min(self.feed.len());
        let items = self.feed[self.position..end].to_vec();
        self.position = end;
        self.has_more = self.position < self.feed.len();

        Ok(Page {
            items,
            continuation: Some(Self::token_for(self.position)),
            has_more: self.has_more,
        })
    }
}
