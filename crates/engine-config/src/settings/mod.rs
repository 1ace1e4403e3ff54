use crate::settings::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, str::FromStr};
use tracing::info;

pub mod error;
pub mod validated;
pub mod validator;

pub const ENV_PREFIX: &str = "FEEDSCAN_";
pub const ENV_DATABASE_ID: &str = "FEEDSCAN_DATABASE_ID";
pub const ENV_COLLECTION_ID: &str = "FEEDSCAN_COLLECTION_ID";
pub const ENV_CONCURRENCY: &str = "FEEDSCAN_CONCURRENCY";
pub const ENV_TIMEZONE: &str = "FEEDSCAN_TIMEZONE";

/// What to do when a partition key range has no openable change feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableRangePolicy {
    /// Log the gap, treat the range as not found and keep scanning.
    #[default]
    Skip,
    /// Stop the whole scan and report not found, dropping earlier matches.
    Abort,
}

/// What to do with a feed document lacking a valid `resourceType` or `_ts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidDocumentPolicy {
    #[default]
    Skip,
    Fail,
}

impl FromStr for UnavailableRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown unavailable range policy '{other}'")),
        }
    }
}

impl FromStr for InvalidDocumentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown invalid document policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

/// Raw scan configuration as read from a settings file and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Database used when a request does not name one.
    pub database_id: Option<String>,
    /// Collection used when a request does not name one.
    pub collection_id: Option<String>,
    /// Partition key ranges read in parallel.
    pub concurrency: usize,
    /// Page size requested from the feed; `None` asks for as many as available.
    pub max_item_count: Option<usize>,
    /// IANA zone a local watermark is read in.
    pub timezone: String,
    pub retry: RetrySettings,
    pub unavailable_range_policy: UnavailableRangePolicy,
    pub invalid_document_policy: InvalidDocumentPolicy,
    /// Overall scan deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            database_id: None,
            collection_id: None,
            concurrency: 4,
            max_item_count: None,
            timezone: "UTC".to_string(),
            retry: RetrySettings::default(),
            unavailable_range_policy: UnavailableRangePolicy::default(),
            invalid_document_policy: InvalidDocumentPolicy::default(),
            timeout_ms: None,
        }
    }
}

impl ScanSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SettingsError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let settings = Self::from_json(&json)?;
        info!("Loaded scan settings from {}", path.display());
        Ok(settings)
    }

    /// Overrides fields from `FEEDSCAN_*` variables present in `vars`.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), SettingsError> {
        if let Some(db) = vars.get(ENV_DATABASE_ID) {
            self.database_id = Some(db.clone());
        }
        if let Some(coll) = vars.get(ENV_COLLECTION_ID) {
            self.collection_id = Some(coll.clone());
        }
        if let Some(tz) = vars.get(ENV_TIMEZONE) {
            self.timezone = tz.clone();
        }
        if let Some(raw) = vars.get(ENV_CONCURRENCY) {
            self.concurrency = raw.parse().map_err(|_| SettingsError::InvalidEnv {
                var: ENV_CONCURRENCY.to_string(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}
