//! Run report shown at the end of a run.

use crate::core::placement::PlacementSummary;
use crate::error::ReportError;
use crate::events::PipelineSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the CLI prints after a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub summary: PipelineSummary,
    pub placement: PlacementSummary,
    /// Where `mapping.csv` was written
    pub report: PathBuf,
    /// Cache location, absent when caching is disabled
    pub cache: Option<PathBuf>,
    pub max_distance: u32,
    /// Non-fatal problems met during the run
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReportError::SerializationFailed(e.to_string()))
    }

    /// Files excluded from either set because they could not be decoded
    pub fn decode_failures(&self) -> usize {
        self.summary.reference_failures + self.summary.query_failures
    }
}
