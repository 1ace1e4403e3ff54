use model::records::document::Document;

/// Decides whether a document belongs in the scan result.
///
/// Implementations must be pure: the same document always yields the same
/// decision, independent of which page it arrived on.
pub trait Filter: Send + Sync {
    fn should_keep(&self, doc: &Document) -> bool;
}

/// Keeps documents whose `resourceType` equals the tag exactly (case-sensitive).
pub struct ResourceTypeFilter {
    resource_type: String,
}

impl ResourceTypeFilter {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
        }
    }
}

impl Filter for ResourceTypeFilter {
    fn should_keep(&self, doc: &Document) -> bool {
        doc.resource_type == self.resource_type
    }
}

/// Keeps documents modified at or after the watermark (inclusive).
pub struct ModifiedSinceFilter {
    watermark_seconds: i64,
}

impl ModifiedSinceFilter {
    pub fn new(watermark_seconds: i64) -> Self {
        Self { watermark_seconds }
    }
}

impl Filter for ModifiedSinceFilter {
    fn should_keep(&self, doc: &Document) -> bool {
        doc.ts >= self.watermark_seconds
    }
}

/// `resourceType == resource_type && _ts >= watermark_seconds`.
pub fn matches(doc: &Document, resource_type: &str, watermark_seconds: i64) -> bool {
    doc.resource_type == resource_type && doc.ts >= watermark_seconds
}

/// The scan's filter: a resource type and an optional watermark.
pub struct DocumentFilter {
    resource_type: ResourceTypeFilter,
    since: Option<ModifiedSinceFilter>,
}

impl DocumentFilter {
    pub fn new(resource_type: impl Into<String>, watermark_seconds: Option<i64>) -> Self {
        Self {
            resource_type: ResourceTypeFilter::new(resource_type),
            since: watermark_seconds.map(ModifiedSinceFilter::new),
        }
    }

    /// Keeps the matching documents of one page, preserving their order.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        docs.into_iter().filter(|d| self.should_keep(d)).collect()
    }
}

impl Filter for DocumentFilter {
    fn should_keep(&self, doc: &Document) -> bool {
        self.resource_type.should_keep(doc)
            && self.since.as_ref().is_none_or(|since| since.should_keep(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(resource_type: &str, ts: i64) -> Document {
        Document::new(resource_type, ts)
    }

    #[test]
    fn test_watermark_is_inclusive() {
        assert!(matches(&doc("Patient", 100), "Patient", 100));
        assert!(matches(&doc("Patient", 101), "Patient", 100));
        assert!(!matches(&doc("Patient", 99), "Patient", 100));
    }

    #[test]
    fn test_resource_type_is_exact() {
        assert!(!matches(&doc("patient", 500), "Patient", 100));
        assert!(!matches(&doc("Patient ", 500), "Patient", 100));
        assert!(!matches(&doc("Observation", 500), "Patient", 100));
    }

    #[test]
    fn test_document_filter_without_watermark_ignores_time() {
        let filter = DocumentFilter::new("Patient", None);
        assert!(filter.should_keep(&doc("Patient", i64::MIN)));
        assert!(!filter.should_keep(&doc("Observation", 0)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = DocumentFilter::new("Patient", Some(100));
        let kept = filter.apply(vec![
            doc("Patient", 300),
            doc("Patient", 50),
            doc("Observation", 400),
            doc("Patient", 100),
        ]);
        assert_eq!(kept, vec![doc("Patient", 300), doc("Patient", 100)]);
    }

    #[test]
    fn test_filter_is_independent_of_page_boundaries() {
        let docs: Vec<Document> = (0..20)
            .map(|i| doc(if i % 3 == 0 { "Observation" } else { "Patient" }, i * 10))
            .collect();
        let filter = DocumentFilter::new("Patient", Some(70));
        let whole = filter.apply(docs.clone());

        for page_size in 1..=docs.len() {
            let paged: Vec<Document> = docs
                .chunks(page_size)
                .flat_map(|chunk| filter.apply(chunk.to_vec()))
                .collect();
            assert_eq!(paged, whole, "page size {page_size}");
        }
    }
}
