//! The `mapping.csv` report.

use crate::core::matcher::MatchOutcome;
use crate::core::placement::PlacementRecord;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// File name of the mapping report inside the output folder
pub const MAPPING_FILE_NAME: &str = "mapping.csv";

const HEADERS: [&str; 5] = ["edited", "raw_match", "distance", "status", "copied_to"];

/// One row of the mapping report. Missing values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub edited: String,
    pub raw_match: String,
    pub distance: String,
    pub status: String,
    pub copied_to: String,
}

impl MappingRow {
    pub fn new(outcome: &MatchOutcome, placement: Option<&PlacementRecord>) -> Self {
        Self {
            edited: outcome.query_path.display().to_string(),
            raw_match: outcome
                .matched_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            distance: outcome.distance.map(|d| d.to_string()).unwrap_or_default(),
            status: outcome.status.to_string(),
            copied_to: placement
                .and_then(|record| record.copied_to.as_ref())
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Pair outcomes with their placement records (same order, same length).
/// With no records, `copied_to` stays empty.
pub fn mapping_rows(outcomes: &[MatchOutcome], placements: &[PlacementRecord]) -> Vec<MappingRow> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| MappingRow::new(outcome, placements.get(i)))
        .collect()
}

/// Write the mapping report to any writer
pub fn write_mapping_csv<W: Write>(rows: &[MappingRow], writer: W) -> Result<(), ReportError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    let serialization = |e: csv::Error| ReportError::SerializationFailed(e.to_string());

    csv_writer.write_record(HEADERS).map_err(serialization)?;
    for row in rows {
        csv_writer.serialize(row).map_err(serialization)?;
    }
    csv_writer
        .flush()
        .map_err(|e| ReportError::SerializationFailed(e.to_string()))
}

/// Write the mapping report to `path`, creating parent directories.
pub fn write_mapping_file(path: &Path, rows: &[MappingRow]) -> Result<(), ReportError> {
    let write_failed = |reason: String| ReportError::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    }
    let file = fs::File::create(path).map_err(|e| write_failed(e.to_string()))?;
    write_mapping_csv(rows, std::io::BufWriter::new(file))?;

    tracing::debug!("wrote {} mapping row(s) to {}", rows.len(), path.display());
    Ok(())
}
