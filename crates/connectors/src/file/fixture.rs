use crate::{error::StoreError, memory::MemoryStore};
use model::{core::identifiers::CollectionRef, records::range::PartitionKeyRange};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// On-disk description of a document store, used to run scans offline.
///
/// ```json
/// {
///   "feedPageSize": 100,
///   "databases": [{
///     "id": "fhir",
///     "collections": [{
///       "id": "resources",
///       "partitions": [{
///         "id": "0", "minInclusive": "", "maxExclusive": "FF",
///         "documents": [{"id": "p-1", "resourceType": "Patient", "_ts": 100}]
///       }]
///     }]
///   }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub feed_page_size: Option<usize>,
    #[serde(default)]
    pub range_page_size: Option<usize>,
    pub databases: Vec<FixtureDatabase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDatabase {
    pub id: String,
    #[serde(default)]
    pub collections: Vec<FixtureCollection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCollection {
    pub id: String,
    #[serde(default)]
    pub partitions: Vec<FixturePartition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturePartition {
    #[serde(flatten)]
    pub range: PartitionKeyRange,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub documents: Vec<Value>,
}

impl Fixture {
    pub fn into_store(self) -> MemoryStore {
        let mut store = MemoryStore::new();
        if let Some(size) = self.feed_page_size {
            store = store.with_feed_page_size(size);
        }
        if let Some(size) = self.range_page_size {
            store = store.with_range_page_size(size);
        }

        for database in self.databases {
            for collection in database.collections {
                let coll = CollectionRef::new(database.id.clone(), collection.id);
                store.create_collection(&coll);

                for partition in collection.partitions {
                    let range_id = partition.range.id.clone();
                    store.add_partition(&coll, partition.range, partition.documents);
                    if partition.unavailable {
                        store.set_available(&coll, &range_id, false);
                    }
                }
            }
        }

        store
    }
}

/// Parses a fixture from its JSON text.
pub fn parse(json: &str) -> Result<MemoryStore, StoreError> {
    let fixture: Fixture = serde_json::from_str(json)?;
    Ok(fixture.into_store())
}

/// Loads a fixture file into a [`MemoryStore`].
pub async fn load(path: impl AsRef<Path>) -> Result<MemoryStore, StoreError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await?;
    let store = parse(&json)?;
    info!("Loaded store fixture from {}", path.display());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChangeFeedOptions, DocumentStore};
    use std::io::Write;

    const FIXTURE: &str = r#"
    {
        "feedPageSize": 1,
        "databases": [{
            "id": "fhir",
            "collections": [{
                "id": "resources",
                "partitions": [
                    {
                        "id": "0", "minInclusive": "", "maxExclusive": "7F",
                        "documents": [
                            {"id": "p-1", "resourceType": "Patient", "_ts": 100},
                            {"id": "p-2", "resourceType": "Patient", "_ts": 200}
                        ]
                    },
                    {"id": "1", "minInclusive": "7F", "maxExclusive": "FF", "unavailable": true}
                ]
            }]
        }]
    }
    "#;

    #[tokio::test]
    async fn test_fixture_builds_store() {
        let store = parse(FIXTURE).unwrap();
        let coll = CollectionRef::new("fhir", "resources");

        let ranges = store.list_partition_key_ranges(&coll, None).await.unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.items[1].min_inclusive, "7F");

        let mut cursor = store
            .open_change_feed(&coll, &ChangeFeedOptions::from_beginning("0".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cursor.fetch_next_page().await.unwrap().len(), 1);

        let unavailable = store
            .open_change_feed(&coll, &ChangeFeedOptions::from_beginning("1".into()))
            .await
            .unwrap();
        assert!(unavailable.is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let store = load(file.path()).await.unwrap();
        assert_eq!(store.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_fixture() {
        assert!(matches!(parse("{\"databases\": 3}"), Err(StoreError::Json(_))));
        assert!(matches!(
            load("/definitely/not/here.json").await,
            Err(StoreError::Io(_))
        ));
    }
}
