use crate::settings::{ScanSettings, error::SettingsError, validated::ValidatedSettings};
use engine_core::retry::RetryPolicy;
use model::core::{identifiers::CollectionRef, watermark::parse_reference_zone};
use std::time::Duration;
use tracing::{info, warn};

const MAX_SENSIBLE_CONCURRENCY: usize = 64;

/// Validates raw scan settings and resolves them into [`ValidatedSettings`].
pub struct SettingsValidator;

impl SettingsValidator {
    pub fn validate(settings: &ScanSettings) -> Result<ValidatedSettings, SettingsError> {
        let mut errors: Vec<String> = Vec::new();
        let mut validated = ValidatedSettings::default()
            .with_unavailable_range_policy(settings.unavailable_range_policy)
            .with_invalid_document_policy(settings.invalid_document_policy)
            .with_timeout(settings.timeout_ms.map(Duration::from_millis));

        match Self::default_collection(settings) {
            Ok(coll) => validated.default_collection = coll,
            Err(msg) => errors.push(msg),
        }

        if settings.concurrency == 0 {
            errors.push("concurrency must be at least 1".to_string());
        } else {
            if settings.concurrency > MAX_SENSIBLE_CONCURRENCY {
                warn!(
                    "Concurrency {} is very high and may exhaust the store's request budget",
                    settings.concurrency
                );
            }
            validated.concurrency = settings.concurrency;
        }

        match settings.max_item_count {
            Some(0) => errors.push("max_item_count must be positive when set".to_string()),
            other => validated.max_item_count = other,
        }

        match parse_reference_zone(&settings.timezone) {
            Ok(zone) => validated.reference_zone = zone,
            Err(e) => errors.push(e.to_string()),
        }

        if settings.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be at least 1".to_string());
        } else if settings.retry.max_delay_ms != 0
            && settings.retry.max_delay_ms < settings.retry.base_delay_ms
        {
            errors.push("retry.max_delay_ms must not be below retry.base_delay_ms".to_string());
        } else {
            validated.retry = RetryPolicy::new(
                settings.retry.max_attempts,
                Duration::from_millis(settings.retry.base_delay_ms),
                Duration::from_millis(settings.retry.max_delay_ms),
            );
        }

        if settings.timeout_ms == Some(0) {
            errors.push("timeout_ms must be positive when set".to_string());
        }

        if !errors.is_empty() {
            return Err(SettingsError::ValidationFailed(errors));
        }

        info!("Settings validation completed successfully");
        Ok(validated)
    }

    fn default_collection(settings: &ScanSettings) -> Result<Option<CollectionRef>, String> {
        match (&settings.database_id, &settings.collection_id) {
            (Some(db), Some(coll)) if !db.is_empty() && !coll.is_empty() => {
                Ok(Some(CollectionRef::new(db.clone(), coll.clone())))
            }
            (None, None) => Ok(None),
            _ => Err("database_id and collection_id must be set together".to_string()),
        }
    }
}
