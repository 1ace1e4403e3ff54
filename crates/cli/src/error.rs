use connectors::error::StoreError;
use engine_config::settings::error::SettingsError;
use engine_runtime::error::ScanError;
use model::core::watermark::WatermarkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read or write a file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load the store fixture: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid watermark: {0}")]
    Watermark(#[from] WatermarkError),

    #[error("Failed to run the scan: {0}")]
    Scan(#[from] ScanError),

    #[error("Failed to deserialize JSON: {0}")]
    JsonDeserialize(#[from] serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
