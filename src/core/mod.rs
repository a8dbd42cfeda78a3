//! # Core Module
//!
//! The matching engine.
//!
//! ## Modules
//! - `scanner` - Enumerates candidate image files
//! - `hasher` - Computes 64-bit perceptual fingerprints
//! - `cache` - Persists raw-set fingerprints between runs
//! - `matcher` - Finds the nearest raw photo for an edited photo
//! - `pipeline` - Orchestrates the full workflow
//! - `placement` - Copies or links matched raw files into the output folder
//! - `reporter` - Writes the mapping report and run summary

pub mod cache;
pub mod hasher;
pub mod matcher;
pub mod pipeline;
pub mod placement;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use hasher::{Fingerprint, FingerprintedFile, PerceptualHash};
pub use matcher::{MatchOutcome, MatchStatus};
pub use placement::PlacementMode;
pub use scanner::PhotoFile;
