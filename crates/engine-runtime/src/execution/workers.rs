use crate::error::ScanError;
use engine_config::{
    report::summary::{RangeReport, RangeState},
    settings::InvalidDocumentPolicy,
};
use engine_core::context::scan::ScanContext;
use engine_processing::{feed::reader::FeedReader, filter::DocumentFilter};
use model::{
    pagination::{continuation::ContinuationToken, paginator::Paginator},
    records::{document::Document, range::PartitionKeyRange},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

/// Lifecycle of a single partition key range within a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePhase {
    Unopened,
    /// The feed is open and reports more pages.
    Reading,
    /// The last page has been fetched and is being filtered.
    Draining,
    Done,
    Failed,
}

/// What one range contributed to the scan.
#[derive(Debug)]
pub struct RangeOutcome {
    pub report: RangeReport,
    pub matches: Vec<Document>,
}

impl RangeOutcome {
    pub fn is_unavailable(&self) -> bool {
        self.report.state == RangeState::Unavailable
    }
}

/// Drains the change feed of one partition key range and filters it.
pub struct RangeWorker {
    ctx: ScanContext,
    range: PartitionKeyRange,
    resume_from: Option<ContinuationToken>,
    filter: Arc<DocumentFilter>,
    invalid_documents: InvalidDocumentPolicy,
    phase: RangePhase,
}

impl RangeWorker {
    pub fn new(
        ctx: ScanContext,
        range: PartitionKeyRange,
        resume_from: Option<ContinuationToken>,
        filter: Arc<DocumentFilter>,
        invalid_documents: InvalidDocumentPolicy,
    ) -> Self {
        Self {
            ctx,
            range,
            resume_from,
            filter,
            invalid_documents,
            phase: RangePhase::Unopened,
        }
    }

    pub fn phase(&self) -> RangePhase {
        self.phase
    }

    fn transition(&mut self, next: RangePhase) {
        debug!(range_id = %self.range.id, from = ?self.phase, to = ?next, "Range phase change.");
        self.phase = next;
    }

    /// Reads every page of the range.
    ///
    /// An unopenable feed is not an error: whether the store hands back no
    /// cursor or fails the open, the range yields an outcome in the
    /// `Unavailable` state. Cancellation abandons the in-flight call and
    /// discards whatever the range matched so far.
    pub async fn run(&mut self) -> Result<RangeOutcome, ScanError> {
        let cancel = self.ctx.cancel.clone();
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            opened = FeedReader::open(
                &self.ctx,
                &self.range,
                self.resume_from.clone(),
                self.invalid_documents,
            ) => opened,
        };

        let mut reader = match opened {
            Ok(reader) => reader,
            Err(e) if e.is_unavailable() => {
                warn!(
                    range_id = %e.range_id(),
                    error = %e,
                    "Change feed unavailable; range treated as not found."
                );
                self.ctx.metrics.increment_unavailable(1);
                self.transition(RangePhase::Failed);
                return Ok(RangeOutcome {
                    report: RangeReport::unavailable(e.range_id().clone()),
                    matches: Vec::new(),
                });
            }
            Err(e) => {
                self.transition(RangePhase::Failed);
                return Err(e.into());
            }
        };

        self.transition(RangePhase::Reading);
        let mut matches = Vec::new();

        while reader.has_next() {
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                page = reader.next_page() => page,
            };

            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    self.transition(RangePhase::Failed);
                    return Err(e.into());
                }
            };

            if !page.has_more {
                self.transition(RangePhase::Draining);
            }

            let kept = self.filter.apply(page.items);
            self.ctx.metrics.increment_matched(kept.len() as u64);
            matches.extend(kept);
        }

        self.transition(RangePhase::Done);
        info!(
            range_id = %self.range.id,
            pages = reader.pages_read(),
            scanned = reader.documents_scanned(),
            matched = matches.len(),
            "Range drained."
        );

        Ok(RangeOutcome {
            report: RangeReport {
                range_id: self.range.id.clone(),
                state: RangeState::Done,
                pages_read: reader.pages_read(),
                documents_scanned: reader.documents_scanned(),
                documents_matched: matches.len() as u64,
                documents_rejected: reader.documents_rejected(),
                continuation: reader.continuation().cloned(),
            },
            matches,
        })
    }
}

/// Runs a range worker on its own task, inside the caller's span.
pub fn spawn(mut worker: RangeWorker) -> JoinHandle<Result<RangeOutcome, ScanError>> {
    tokio::spawn(async move { worker.run().await }.in_current_span())
}
