use crate::{
    error::ScanError,
    execution::{
        request::{ScanRequest, ScanResult},
        workers::{self, RangeOutcome, RangeWorker},
    },
};
use connectors::store::DocumentStore;
use engine_config::{
    report::summary::{RangeReport, RangeState, ScanReport},
    settings::{UnavailableRangePolicy, validated::ValidatedSettings},
};
use engine_core::context::scan::ScanContext;
use engine_processing::{feed::ranges::list_all_ranges, filter::DocumentFilter};
use futures::{StreamExt, stream};
use model::{
    core::identifiers::CollectionRef,
    records::{outcome::ScanOutcome, range::PartitionKeyRange},
};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

pub async fn run(
    store: Arc<dyn DocumentStore>,
    settings: ValidatedSettings,
    request: ScanRequest,
    cancel: CancellationToken,
) -> Result<ScanResult, ScanError> {
    ScanExecutor::new(store, settings)
        .execute(request, cancel)
        .await
}

/// Drives a scan: enumerate the ranges, drain each range's feed on a
/// bounded pool of workers and merge what they matched.
pub struct ScanExecutor {
    store: Arc<dyn DocumentStore>,
    settings: ValidatedSettings,
}

/// A scan whose request has been validated and whose watermark is converted.
struct PreparedScan {
    ctx: ScanContext,
    request: ScanRequest,
    watermark_seconds: Option<i64>,
}

impl ScanExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, settings: ValidatedSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ValidatedSettings {
        &self.settings
    }

    pub async fn execute(
        &self,
        request: ScanRequest,
        cancel: CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        let scan = self.prepare(request, cancel)?;
        let ctx = scan.ctx.clone();

        let span = info_span!(
            "scan",
            scan_id = %ctx.scan_id,
            collection = %ctx.collection,
            resource_type = %scan.request.resource_type,
        );
        let work = self.scan(scan).instrument(span);

        let result = match self.settings.timeout {
            None => work.await,
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(scan_id = %ctx.scan_id, "Scan exceeded its deadline of {:?}.", limit);
                    Err(ScanError::TimedOut(limit))
                }
            },
        };

        // Stops range tasks still running after an abort, a failure or a timeout.
        ctx.cancel.cancel();
        result
    }

    fn prepare(
        &self,
        request: ScanRequest,
        cancel: CancellationToken,
    ) -> Result<PreparedScan, ScanError> {
        if request.resource_type.is_empty() {
            return Err(ScanError::InvalidRequest(
                "resource type must not be empty".to_string(),
            ));
        }

        let collection = self.resolve_collection(request.collection.as_ref())?;

        let watermark_seconds = request
            .since
            .map(|w| w.to_epoch_seconds(self.settings.reference_zone))
            .transpose()?;

        let ctx = ScanContext::new(
            self.store.clone(),
            collection,
            self.settings.retry.clone(),
            cancel.child_token(),
        )
        .with_max_item_count(self.settings.max_item_count);

        Ok(PreparedScan {
            ctx,
            request,
            watermark_seconds,
        })
    }

    fn resolve_collection(
        &self,
        collection: Option<&CollectionRef>,
    ) -> Result<CollectionRef, ScanError> {
        collection
            .or(self.settings.default_collection.as_ref())
            .cloned()
            .ok_or_else(|| {
                ScanError::InvalidRequest(
                    "no collection given and no default collection configured".to_string(),
                )
            })
    }

    /// Lists the partition key ranges a scan of `collection` would read.
    pub async fn list_ranges(
        &self,
        collection: Option<CollectionRef>,
        cancel: CancellationToken,
    ) -> Result<Vec<PartitionKeyRange>, ScanError> {
        let collection = self.resolve_collection(collection.as_ref())?;
        let ctx = ScanContext::new(
            self.store.clone(),
            collection,
            self.settings.retry.clone(),
            cancel,
        );

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(ScanError::Cancelled),
            ranges = list_all_ranges(&ctx) => Ok(ranges?),
        }
    }

    async fn scan(&self, scan: PreparedScan) -> Result<ScanResult, ScanError> {
        let started = Instant::now();
        let PreparedScan {
            ctx,
            request,
            watermark_seconds,
        } = scan;

        info!(watermark_seconds = ?watermark_seconds, "Starting change feed scan.");

        let ranges = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(ScanError::Cancelled),
            ranges = list_all_ranges(&ctx) => ranges?,
        };
        let range_count = ranges.len();

        let filter = Arc::new(DocumentFilter::new(
            request.resource_type.clone(),
            watermark_seconds,
        ));
        let policy = self.settings.invalid_document_policy;

        let mut outcomes = stream::iter(ranges.into_iter().map(|range| {
            let resume_from = request.resume.get(&range.id).cloned();
            workers::spawn(RangeWorker::new(
                ctx.clone(),
                range,
                resume_from,
                filter.clone(),
                policy,
            ))
        }))
        .buffered(self.settings.concurrency.max(1));

        let mut reports: Vec<RangeReport> = Vec::with_capacity(range_count);
        let mut matched = Vec::new();
        let mut aborted = false;

        while let Some(joined) = outcomes.next().await {
            let outcome = joined??;

            if outcome.is_unavailable()
                && self.settings.unavailable_range_policy == UnavailableRangePolicy::Abort
            {
                warn!(
                    range_id = %outcome.report.range_id,
                    discarded = matched.len(),
                    "Aborting scan on unavailable range."
                );
                reports.push(outcome.report);
                aborted = true;
                break;
            }

            let RangeOutcome { report, matches } = outcome;
            matched.extend(matches);
            reports.push(report);
        }

        let all_unavailable = reports.iter().all(|r| r.state == RangeState::Unavailable);
        let not_found = aborted || all_unavailable;

        let outcome = if not_found {
            ScanOutcome::NotFound
        } else {
            ScanOutcome::Found(matched)
        };

        let report = ScanReport {
            scan_id: ctx.scan_id.clone(),
            collection: ctx.collection.clone(),
            resource_type: request.resource_type,
            watermark_seconds,
            not_found,
            ranges: reports,
            metrics: ctx.metrics.snapshot(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            ranges = range_count,
            unavailable = report.unavailable_ranges().count(),
            matched = outcome.documents().len(),
            not_found,
            elapsed_ms = report.elapsed_ms,
            "Change feed scan finished."
        );

        Ok(ScanResult { outcome, report })
    }
}
