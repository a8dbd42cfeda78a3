//! # Matcher Module
//!
//! Finds, for one edited photo, the closest raw photo by fingerprint.
//!
//! ## How It Works
//! A linear scan over the reference set keeps the entry with the smallest
//! Hamming distance seen so far. An equal distance never replaces the
//! current best, so the earliest entry in reference order wins ties. A
//! distance of 0 stops the scan.
//!
//! The nearest candidate is reported even when it is too far away to
//! count as a match, so reports can show how close the miss was.

mod threshold;

pub use threshold::ThresholdStrategy;

use crate::core::hasher::{hamming_distance, Fingerprint, FingerprintedFile};
use crate::events::{Event, EventSender, MatchEvent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether an edited photo was traced back to a raw file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    NoMatch,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of matching one query photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// The edited photo
    pub query_path: PathBuf,
    pub query_fingerprint: Fingerprint,
    /// Nearest raw photo, present whenever the reference set was non-empty
    pub matched_path: Option<PathBuf>,
    pub matched_fingerprint: Option<Fingerprint>,
    /// Distance to the nearest raw photo
    pub distance: Option<u32>,
    pub status: MatchStatus,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        self.status == MatchStatus::Matched
    }

    /// The raw file to place, only for matched outcomes
    pub fn placement_source(&self) -> Option<&PathBuf> {
        if self.is_match() {
            self.matched_path.as_ref()
        } else {
            None
        }
    }
}

/// Find the nearest reference entry for `query`.
///
/// `threshold` decides the status only; it never limits which candidate
/// is reported.
pub fn best_match(
    query: &FingerprintedFile,
    reference: &[FingerprintedFile],
    threshold: ThresholdStrategy,
) -> MatchOutcome {
    let mut best: Option<(&FingerprintedFile, u32)> = None;

    for candidate in reference {
        let distance = hamming_distance(query.fingerprint, candidate.fingerprint);
        let closer = best.map_or(true, |(_, current)| distance < current);
        if closer {
            best = Some((candidate, distance));
            if distance == 0 {
                break;
            }
        }
    }

    let status = match best {
        Some((_, distance)) if threshold.accepts(distance) => MatchStatus::Matched,
        _ => MatchStatus::NoMatch,
    };

    MatchOutcome {
        query_path: query.path.clone(),
        query_fingerprint: query.fingerprint,
        matched_path: best.map(|(file, _)| file.path.clone()),
        matched_fingerprint: best.map(|(file, _)| file.fingerprint),
        distance: best.map(|(_, distance)| distance),
        status,
    }
}

/// Match every query in order, one outcome per query.
pub fn match_all(
    queries: &[FingerprintedFile],
    reference: &[FingerprintedFile],
    threshold: ThresholdStrategy,
    events: &EventSender,
) -> Vec<MatchOutcome> {
    let total = queries.len();
    events.send(Event::Match(MatchEvent::Started {
        queries: total,
        references: reference.len(),
    }));

    let outcomes: Vec<MatchOutcome> = queries
        .iter()
        .enumerate()
        .map(|(index, query)| {
            let outcome = best_match(query, reference, threshold);
            events.send(Event::Match(MatchEvent::Progress {
                completed: index + 1,
                total,
            }));
            outcome
        })
        .collect();

    let matched = outcomes.iter().filter(|o| o.is_match()).count();
    events.send(Event::Match(MatchEvent::Completed {
        matched,
        unmatched: total - matched,
    }));

    outcomes
}
