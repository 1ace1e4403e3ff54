use crate::{error::ReaderError, retry::classify_store_error};
use async_trait::async_trait;
use connectors::{
    error::StoreError,
    store::{ChangeFeedOptions, FeedCursor},
};
use engine_config::settings::InvalidDocumentPolicy;
use engine_core::{context::scan::ScanContext, metrics::Metrics, retry::RetryPolicy};
use model::{
    core::identifiers::RangeId,
    pagination::{continuation::ContinuationToken, page::Page, paginator::Paginator},
    records::{document::Document, range::PartitionKeyRange},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Reads the change feed of one partition key range page by page.
///
/// Documents are parsed into [`Document`]s as they arrive. Pages may be
/// empty while the feed still reports more results; callers keep pulling
/// until [`Paginator::has_next`] turns false.
pub struct FeedReader {
    range_id: RangeId,
    cursor: Arc<Mutex<Box<dyn FeedCursor>>>,
    retry: RetryPolicy,
    metrics: Metrics,
    invalid_documents: InvalidDocumentPolicy,
    has_more: bool,
    pages_read: u64,
    documents_scanned: u64,
    documents_rejected: u64,
    last_continuation: Option<ContinuationToken>,
}

impl FeedReader {
    /// Opens the range's feed from the beginning, or from `resume_from` when given.
    ///
    /// Returns [`ReaderError::FeedUnavailable`] when the store has no feed
    /// for the range.
    pub async fn open(
        ctx: &ScanContext,
        range: &PartitionKeyRange,
        resume_from: Option<ContinuationToken>,
        invalid_documents: InvalidDocumentPolicy,
    ) -> Result<Self, ReaderError> {
        let options = match resume_from.clone() {
            Some(token) => ChangeFeedOptions::resume(range.id.clone(), token),
            None => ChangeFeedOptions::from_beginning(range.id.clone()),
        }
        .with_max_item_count(ctx.max_item_count);

        let store = ctx.store.clone();
        let collection = ctx.collection.clone();

        let opened = ctx
            .retry
            .run(
                || {
                    let store = store.clone();
                    let collection = collection.clone();
                    let options = options.clone();
                    async move { store.open_change_feed(&collection, &options).await }
                },
                classify_store_error,
            )
            .await
            .map_err(|e| ReaderError::Open {
                range_id: range.id.clone(),
                source: e.into_inner(),
            })?;

        let Some(cursor) = opened else {
            return Err(ReaderError::FeedUnavailable(range.id.clone()));
        };

        debug!(
            range_id = %range.id,
            resumed = resume_from.is_some(),
            "Opened change feed."
        );

        Ok(Self {
            range_id: range.id.clone(),
            has_more: cursor.has_more_results(),
            cursor: Arc::new(Mutex::new(cursor)),
            retry: ctx.retry.clone(),
            metrics: ctx.metrics.clone(),
            invalid_documents,
            pages_read: 0,
            documents_scanned: 0,
            documents_rejected: 0,
            last_continuation: resume_from,
        })
    }

    pub fn range_id(&self) -> &RangeId {
        &self.range_id
    }

    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    pub fn documents_scanned(&self) -> u64 {
        self.documents_scanned
    }

    pub fn documents_rejected(&self) -> u64 {
        self.documents_rejected
    }

    /// Token to resume this range after the last page read.
    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.last_continuation.as_ref()
    }

    fn parse_page(&mut self, raw: Vec<serde_json::Value>) -> Result<Vec<Document>, ReaderError> {
        let mut documents = Vec::with_capacity(raw.len());

        for value in raw {
            match Document::from_value(value) {
                Ok(doc) => documents.push(doc),
                Err(source) => match self.invalid_documents {
                    InvalidDocumentPolicy::Fail => {
                        return Err(ReaderError::InvalidDocument {
                            range_id: self.range_id.clone(),
                            source,
                        });
                    }
                    InvalidDocumentPolicy::Skip => {
                        warn!(
                            range_id = %self.range_id,
                            page = self.pages_read,
                            error = %source,
                            "Skipping invalid change feed document."
                        );
                        self.documents_rejected += 1;
                        self.metrics.increment_rejected(1);
                    }
                },
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl Paginator for FeedReader {
    type Item = Document;
    type Error = ReaderError;

    fn has_next(&self) -> bool {
        self.has_more
    }

    async fn next_page(&mut self) -> Result<Page<Document>, ReaderError> {
        let cursor = self.cursor.clone();
        let page_number = self.pages_read + 1;

        let (page, has_more) = self
            .retry
            .run(
                || {
                    let cursor = cursor.clone();
                    async move {
                        let mut cursor = cursor.lock().await;
                        let page = cursor.fetch_next_page().await?;
                        Ok::<_, StoreError>((page, cursor.has_more_results()))
                    }
                },
                classify_store_error,
            )
            .await
            .map_err(|e| ReaderError::Fetch {
                range_id: self.range_id.clone(),
                page: page_number,
                source: e.into_inner(),
            })?;

        self.has_more = has_more;
        self.pages_read = page_number;
        self.documents_scanned += page.len() as u64;
        self.metrics.increment_pages(1);
        self.metrics.increment_scanned(page.len() as u64);
        if let Some(token) = page.continuation.clone() {
            self.last_continuation = Some(token);
        }

        let continuation = page.continuation;
        let documents = self.parse_page(page.items)?;

        debug!(
            range_id = %self.range_id,
            page = page_number,
            documents = documents.len(),
            more = has_more,
            "Read change feed page."
        );

        Ok(Page {
            items: documents,
            continuation,
            has_more,
        })
    }
}
