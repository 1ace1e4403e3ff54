use crate::error::CliError;
use engine_config::report::summary::ScanReport;
use model::{records::outcome::ScanOutcome, records::range::PartitionKeyRange};
use serde::Serialize;
use std::path::Path;
use tracing::info;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::JsonSerialize)
}

async fn emit(json: String, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Prints the matched documents as a JSON array, or the not-found marker.
pub async fn write_outcome(outcome: &ScanOutcome, path: Option<&Path>) -> Result<(), CliError> {
    let json = match outcome {
        ScanOutcome::Found(documents) => to_json(documents)?,
        ScanOutcome::NotFound => to_json(outcome)?,
    };
    emit(json, path).await
}

pub async fn write_report(report: &ScanReport, path: &Path) -> Result<(), CliError> {
    emit(to_json(report)?, Some(path)).await
}

pub async fn print_ranges(ranges: &[PartitionKeyRange]) -> Result<(), CliError> {
    emit(to_json(ranges)?, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::document::Document;

    #[tokio::test]
    async fn test_found_documents_are_written_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let outcome = ScanOutcome::Found(vec![Document::new("Patient", 100)]);

        write_outcome(&outcome, Some(&path)).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["resourceType"], "Patient");
        assert_eq!(written[0]["_ts"], 100);
    }

    #[tokio::test]
    async fn test_not_found_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_outcome(&ScanOutcome::NotFound, Some(&path)).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["status"], "not_found");
    }
}
