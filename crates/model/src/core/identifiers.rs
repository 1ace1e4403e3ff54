use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(String);

impl RangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RangeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for RangeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a document collection inside a database.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub database_id: String,
    pub collection_id: String,
}

impl CollectionRef {
    pub fn new(database_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }

    /// Resource link of the collection, e.g. `dbs/fhir/colls/resources`.
    pub fn link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database_id, self.collection_id)
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.link())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_link_uses_database_and_collection() {
        let coll = CollectionRef::new("fhir", "resources");
        assert_eq!(coll.link(), "dbs/fhir/colls/resources");
        assert_eq!(coll.to_string(), "dbs/fhir/colls/resources");
    }

    #[test]
    fn range_id_serializes_as_plain_string() {
        let id = RangeId::from("7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
