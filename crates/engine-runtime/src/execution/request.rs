use engine_config::report::summary::ScanReport;
use model::{
    core::{
        identifiers::{CollectionRef, RangeId},
        watermark::Watermark,
    },
    pagination::continuation::ContinuationToken,
    records::outcome::ScanOutcome,
};
use std::collections::BTreeMap;

/// One "new or modified since" query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Falls back to the configured default collection when `None`.
    pub collection: Option<CollectionRef>,
    pub resource_type: String,
    /// Without a watermark every document of the resource type matches.
    pub since: Option<Watermark>,
    /// Ranges listed here open their feed from the token instead of the beginning.
    pub resume: BTreeMap<RangeId, ContinuationToken>,
}

impl ScanRequest {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            collection: None,
            resource_type: resource_type.into(),
            since: None,
            resume: BTreeMap::new(),
        }
    }

    pub fn in_collection(mut self, collection: CollectionRef) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn since(mut self, watermark: Watermark) -> Self {
        self.since = Some(watermark);
        self
    }

    pub fn resume_from(mut self, tokens: BTreeMap<RangeId, ContinuationToken>) -> Self {
        self.resume = tokens;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub outcome: ScanOutcome,
    pub report: ScanReport,
}
