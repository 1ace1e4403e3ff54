use crate::records::document::Document;
use serde::Serialize;

/// Result of a change-feed scan.
///
/// `Found` may hold an empty list: every feed was readable but nothing
/// matched. `NotFound` means no partition yielded an openable feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "documents", rename_all = "snake_case")]
pub enum ScanOutcome {
    Found(Vec<Document>),
    NotFound,
}

impl ScanOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScanOutcome::NotFound)
    }

    pub fn documents(&self) -> &[Document] {
        match self {
            ScanOutcome::Found(docs) => docs,
            ScanOutcome::NotFound => &[],
        }
    }

    pub fn into_documents(self) -> Option<Vec<Document>> {
        match self {
            ScanOutcome::Found(docs) => Some(docs),
            ScanOutcome::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_match_is_not_not_found() {
        let outcome = ScanOutcome::Found(vec![]);
        assert!(!outcome.is_not_found());
        assert!(outcome.documents().is_empty());
        assert_eq!(outcome.into_documents(), Some(vec![]));
    }

    #[test]
    fn serializes_with_status_tag() {
        let found = ScanOutcome::Found(vec![Document::new("Patient", 100)]);
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({"status": "found", "documents": [{"resourceType": "Patient", "_ts": 100}]})
        );
        assert_eq!(
            serde_json::to_value(ScanOutcome::NotFound).unwrap(),
            json!({"status": "not_found"})
        );
    }
}
