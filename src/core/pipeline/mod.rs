//! # Pipeline Module
//!
//! Orchestrates a full matching run.
//!
//! ## Pipeline Stages
//! 1. **Hash raw** - Enumerate the raw set, reuse cached fingerprints,
//!    fingerprint the misses on a worker pool, save the cache snapshot
//! 2. **Hash edited** - Enumerate and fingerprint the edited set (no cache)
//! 3. **Match** - Find the nearest raw photo for every edited photo
//!
//! Files that fail to decode are dropped from their set and counted.
//! A set that ends up empty aborts the run.
//!
//! ## Parallelism
//! Only raw-set cache misses are fingerprinted in parallel, on a rayon
//! pool sized by `workers`. Results are collected in enumeration order,
//! so any worker count produces the same output as `workers = 1`.

mod executor;

pub use executor::{
    Pipeline, PipelineBuilder, PipelineConfig, PipelineResult, QuerySet, ReferenceSet,
};
