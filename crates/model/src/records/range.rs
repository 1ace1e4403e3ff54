use crate::core::identifiers::RangeId;
use serde::{Deserialize, Serialize};

/// A contiguous slice of the collection's partition key hash space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyRange {
    pub id: RangeId,
    #[serde(rename = "minInclusive", default)]
    pub min_inclusive: String,
    #[serde(rename = "maxExclusive", default)]
    pub max_exclusive: String,
}

impl PartitionKeyRange {
    pub fn new(
        id: impl Into<RangeId>,
        min_inclusive: impl Into<String>,
        max_exclusive: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            min_inclusive: min_inclusive.into(),
            max_exclusive: max_exclusive.into(),
        }
    }
}
