use engine_core::metrics::MetricsSnapshot;
use model::{
    core::identifiers::{CollectionRef, RangeId},
    pagination::continuation::ContinuationToken,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Terminal state of one partition key range within a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeState {
    /// Every page of the feed was read.
    Done,
    /// The feed could not be opened; nothing was read from this range.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    pub range_id: RangeId,
    pub state: RangeState,
    pub pages_read: u64,
    pub documents_scanned: u64,
    pub documents_matched: u64,
    pub documents_rejected: u64,
    /// Where a later scan of this range could resume from.
    pub continuation: Option<ContinuationToken>,
}

impl RangeReport {
    pub fn unavailable(range_id: RangeId) -> Self {
        Self {
            range_id,
            state: RangeState::Unavailable,
            pages_read: 0,
            documents_scanned: 0,
            documents_matched: 0,
            documents_rejected: 0,
            continuation: None,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ScanReport {
    pub scan_id: String,
    pub collection: CollectionRef,
    pub resource_type: String,
    pub watermark_seconds: Option<i64>,
    pub not_found: bool,
    pub ranges: Vec<RangeReport>,
    pub metrics: MetricsSnapshot,
    pub elapsed_ms: u64,
}

impl ScanReport {
    pub fn unavailable_ranges(&self) -> impl Iterator<Item = &RangeId> {
        self.ranges
            .iter()
            .filter(|r| r.state == RangeState::Unavailable)
            .map(|r| &r.range_id)
    }

    /// Final continuation of every fully read range, keyed by range id.
    pub fn continuations(&self) -> BTreeMap<RangeId, ContinuationToken> {
        self.ranges
            .iter()
            .filter_map(|r| r.continuation.clone().map(|c| (r.range_id.clone(), c)))
            .collect()
    }
}
