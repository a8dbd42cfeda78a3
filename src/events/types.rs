//! Event type definitions for progress reporting.

use crate::error::InputSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the matching pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// File enumeration events
    Scan(ScanEvent),
    /// Fingerprinting events (reference and query sets)
    Fingerprint(FingerprintEvent),
    /// Matching phase events
    Match(MatchEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during file enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Enumeration of one set has started
    Started { set: InputSet, root: PathBuf },
    /// An entry could not be read; enumeration continues
    Error { path: PathBuf, message: String },
    /// Enumeration of one set completed
    Completed { set: InputSet, total_files: usize },
}

/// Events during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting of a set has started. `total` counts the files that
    /// actually need decoding (cache misses for the reference set).
    Started { set: InputSet, total: usize },
    /// A reference file was reused from the cache
    CacheHit { path: PathBuf },
    /// One more file has been processed
    Progress(FingerprintProgress),
    /// A file could not be decoded and was excluded
    Failed { path: PathBuf, message: String },
    /// Fingerprinting of a set completed
    Completed {
        set: InputSet,
        fingerprinted: usize,
        cache_hits: usize,
        failed: usize,
    },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Which set is being fingerprinted
    pub set: InputSet,
    /// Files processed so far
    pub completed: usize,
    /// Files to process in this phase
    pub total: usize,
    /// File just processed
    pub current_path: PathBuf,
}

/// Events during the matching phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Matching has started
    Started {
        queries: usize,
        references: usize,
    },
    /// One query has been matched
    Progress { completed: usize, total: usize },
    /// Matching completed
    Completed { matched: usize, unmatched: usize },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    FingerprintingRaw,
    FingerprintingEdited,
    Matching,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Reference files with a fingerprint
    pub reference_files: usize,
    /// Query files with a fingerprint
    pub query_files: usize,
    /// Reference fingerprints reused from the cache
    pub cache_hits: usize,
    /// Reference files excluded because they failed to decode
    pub reference_failures: usize,
    /// Query files excluded because they failed to decode
    pub query_failures: usize,
    /// Queries whose best candidate is within the threshold
    pub matched: usize,
    /// Queries without a candidate within the threshold
    pub unmatched: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::FingerprintingRaw => write!(f, "Hashing raw"),
            PipelinePhase::FingerprintingEdited => write!(f, "Hashing edited"),
            PipelinePhase::Matching => write!(f, "Matching"),
        }
    }
}
