//! Pipeline execution implementation.

use crate::core::cache::{CacheEntry, CacheStore, DisabledCache, FingerprintCache};
use crate::core::hasher::{DifferenceHasher, Fingerprint, FingerprintedFile, Fingerprinter};
use crate::core::matcher::{match_all, MatchOutcome, ThresholdStrategy};
use crate::core::scanner::{PhotoFile, PhotoScanner, ScanConfig, ScanResult, WalkDirScanner};
use crate::error::{HashError, InputSet, ScanError, SnapMatchError};
use crate::events::{
    null_sender, Event, EventSender, FingerprintEvent, FingerprintProgress, PipelineEvent,
    PipelinePhase, PipelineSummary, ScanEvent,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// One outcome per edited photo, in enumeration order
    pub outcomes: Vec<MatchOutcome>,
    /// Counts for the run summary
    pub summary: PipelineSummary,
    /// Non-fatal problems (unreadable entries, undecodable files, cache save)
    pub errors: Vec<String>,
}

/// Fingerprinted raw set plus the cache snapshot built from it
#[derive(Debug)]
pub struct ReferenceSet {
    /// Fingerprinted raw files in enumeration order
    pub files: Vec<FingerprintedFile>,
    /// Snapshot holding exactly one entry per file in `files`
    pub cache: FingerprintCache,
    /// Files whose fingerprint came from the loaded cache
    pub cache_hits: usize,
    /// Files excluded because they could not be decoded
    pub failures: Vec<HashError>,
    /// Entries the walk could not read
    pub scan_errors: Vec<ScanError>,
}

/// Fingerprinted edited set
#[derive(Debug)]
pub struct QuerySet {
    pub files: Vec<FingerprintedFile>,
    pub failures: Vec<HashError>,
    pub scan_errors: Vec<ScanError>,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the raw (reference) set
    pub raw_dir: PathBuf,
    /// Root of the edited (query) set
    pub edited_dir: PathBuf,
    /// Maximum distance for a match
    pub threshold: ThresholdStrategy,
    /// Workers for raw-set fingerprinting: 0 = one per CPU, 1 = sequential
    pub workers: usize,
    /// Scanner configuration, used when no custom scanner is supplied
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::new(),
            edited_dir: PathBuf::new(),
            threshold: ThresholdStrategy::default(),
            workers: 0,
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    max_distance: u32,
    cache: Option<Box<dyn CacheStore>>,
    fingerprinter: Option<Box<dyn Fingerprinter>>,
    scanner: Option<Box<dyn PhotoScanner>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            max_distance: ThresholdStrategy::DEFAULT_MAX_DISTANCE,
            cache: None,
            fingerprinter: None,
            scanner: None,
        }
    }

    /// Set the raw (reference) root
    pub fn raw_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.raw_dir = path.into();
        self
    }

    /// Set the edited (query) root
    pub fn edited_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.edited_dir = path.into();
        self
    }

    /// Set the maximum match distance (validated by `build`)
    pub fn max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Set the number of fingerprinting workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Set the cache backend (default: no cache)
    pub fn cache(mut self, cache: Box<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the fingerprint algorithm (default: [`DifferenceHasher`])
    pub fn fingerprinter(mut self, fingerprinter: Box<dyn Fingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    /// Replace the file enumeration (default: [`WalkDirScanner`])
    pub fn scanner(mut self, scanner: Box<dyn PhotoScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Build the pipeline. Fails on an out-of-range max distance.
    pub fn build(self) -> Result<Pipeline, SnapMatchError> {
        let mut config = self.config;
        config.threshold = ThresholdStrategy::new(self.max_distance)?;

        let scanner = self
            .scanner
            .unwrap_or_else(|| Box::new(WalkDirScanner::new(config.scan_config.clone())));

        Ok(Pipeline {
            config,
            cache: self.cache.unwrap_or_else(|| Box::new(DisabledCache)),
            fingerprinter: self
                .fingerprinter
                .unwrap_or_else(|| Box::new(DifferenceHasher::new())),
            scanner,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The matching pipeline
pub struct Pipeline {
    config: PipelineConfig,
    cache: Box<dyn CacheStore>,
    fingerprinter: Box<dyn Fingerprinter>,
    scanner: Box<dyn PhotoScanner>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, SnapMatchError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, SnapMatchError> {
        let start_time = Instant::now();

        // Both roots are checked before any decoding work starts.
        check_root(&self.config.raw_dir)?;
        check_root(&self.config.edited_dir)?;

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: raw set
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::FingerprintingRaw,
        }));
        let reference = self.fingerprint_reference(events)?;
        if reference.files.is_empty() {
            return Err(SnapMatchError::EmptyInputSet {
                set: InputSet::Reference,
            });
        }

        // Phase 2: edited set
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::FingerprintingEdited,
        }));
        let queries = self.fingerprint_queries(events)?;
        if queries.files.is_empty() {
            return Err(SnapMatchError::EmptyInputSet {
                set: InputSet::Query,
            });
        }

        // Phase 3: matching
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Matching,
        }));
        let outcomes = match_all(&queries.files, &reference.files, self.config.threshold, events);

        let matched = outcomes.iter().filter(|o| o.is_match()).count();
        let summary = PipelineSummary {
            reference_files: reference.files.len(),
            query_files: queries.files.len(),
            cache_hits: reference.cache_hits,
            reference_failures: reference.failures.len(),
            query_failures: queries.failures.len(),
            matched,
            unmatched: outcomes.len() - matched,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "matched {} of {} edited photo(s) against {} raw photo(s) in {} ms",
            summary.matched,
            summary.query_files,
            summary.reference_files,
            summary.duration_ms
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: summary.clone(),
        }));

        let errors = reference
            .scan_errors
            .iter()
            .map(ToString::to_string)
            .chain(reference.failures.iter().map(ToString::to_string))
            .chain(queries.scan_errors.iter().map(ToString::to_string))
            .chain(queries.failures.iter().map(ToString::to_string))
            .collect();

        Ok(PipelineResult {
            outcomes,
            summary,
            errors,
        })
    }

    /// Fingerprint the raw set, reusing and then saving the cache.
    ///
    /// The cache is loaded once before any worker starts and saved once
    /// after all of them have finished. A failed save is logged and the
    /// run continues. No snapshot is written when nothing could be
    /// fingerprinted.
    pub fn fingerprint_reference(
        &self,
        events: &EventSender,
    ) -> Result<ReferenceSet, SnapMatchError> {
        let root = &self.config.raw_dir;
        let scan = self.scan(InputSet::Reference, root, events)?;

        let previous = self.cache.load();
        tracing::debug!(
            "loaded {} cached fingerprint(s) from {}",
            previous.len(),
            self.cache.describe()
        );

        let lookups: Vec<Option<Fingerprint>> = scan
            .photos
            .iter()
            .map(|photo| previous.lookup(&photo.path, photo.identity))
            .collect();
        drop(previous);

        let misses: Vec<&PhotoFile> = scan
            .photos
            .iter()
            .zip(&lookups)
            .filter(|(_, cached)| cached.is_none())
            .map(|(photo, _)| photo)
            .collect();
        let cache_hits = scan.photos.len() - misses.len();

        for (photo, _) in scan
            .photos
            .iter()
            .zip(&lookups)
            .filter(|(_, cached)| cached.is_some())
        {
            events.send(Event::Fingerprint(FingerprintEvent::CacheHit {
                path: photo.path.clone(),
            }));
        }

        events.send(Event::Fingerprint(FingerprintEvent::Started {
            set: InputSet::Reference,
            total: misses.len(),
        }));

        let computed = self.compute_parallel(&misses, events)?;

        // Merge in enumeration order. `misses` preserves that order, so the
        // computed results line up with the uncached slots one by one.
        let mut files = Vec::with_capacity(scan.photos.len());
        let mut cache = FingerprintCache::new();
        let mut failures = Vec::new();
        let mut computed = computed.into_iter();

        for (photo, cached) in scan.photos.iter().zip(lookups) {
            let fingerprint = match cached {
                Some(fingerprint) => fingerprint,
                None => match computed.next() {
                    Some(Ok(fingerprint)) => fingerprint,
                    Some(Err(error)) => {
                        failures.push(error);
                        continue;
                    }
                    None => continue,
                },
            };

            cache.insert_path(&photo.path, CacheEntry::new(photo.identity, fingerprint));
            files.push(FingerprintedFile::new(photo.path.clone(), fingerprint));
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            set: InputSet::Reference,
            fingerprinted: files.len(),
            cache_hits,
            failed: failures.len(),
        }));

        tracing::info!(
            "raw set: {} fingerprint(s), {} from cache, {} undecodable",
            files.len(),
            cache_hits,
            failures.len()
        );

        if !files.is_empty() {
            if let Err(e) = self.cache.save(&cache) {
                tracing::warn!("could not save cache to {}: {}", self.cache.describe(), e);
            }
        }

        Ok(ReferenceSet {
            files,
            cache,
            cache_hits,
            failures,
            scan_errors: scan.errors,
        })
    }

    /// Fingerprint the edited set sequentially, without the cache.
    pub fn fingerprint_queries(&self, events: &EventSender) -> Result<QuerySet, SnapMatchError> {
        let root = &self.config.edited_dir;
        let scan = self.scan(InputSet::Query, root, events)?;
        let total = scan.photos.len();

        events.send(Event::Fingerprint(FingerprintEvent::Started {
            set: InputSet::Query,
            total,
        }));

        let mut files = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, photo) in scan.photos.iter().enumerate() {
            match self.fingerprint_one(photo, events) {
                Ok(fingerprint) => {
                    files.push(FingerprintedFile::new(photo.path.clone(), fingerprint))
                }
                Err(error) => failures.push(error),
            }
            events.send(Event::Fingerprint(FingerprintEvent::Progress(
                FingerprintProgress {
                    set: InputSet::Query,
                    completed: index + 1,
                    total,
                    current_path: photo.path.clone(),
                },
            )));
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            set: InputSet::Query,
            fingerprinted: files.len(),
            cache_hits: 0,
            failed: failures.len(),
        }));

        tracing::info!(
            "edited set: {} fingerprint(s), {} undecodable",
            files.len(),
            failures.len()
        );

        Ok(QuerySet {
            files,
            failures,
            scan_errors: scan.errors,
        })
    }

    fn scan(
        &self,
        set: InputSet,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, SnapMatchError> {
        events.send(Event::Scan(ScanEvent::Started {
            set,
            root: root.to_path_buf(),
        }));

        let result = self.scanner.scan_with_events(root, events)?;

        events.send(Event::Scan(ScanEvent::Completed {
            set,
            total_files: result.photos.len(),
        }));
        tracing::debug!(
            "found {} candidate {} file(s) under {}",
            result.photos.len(),
            set,
            root.display()
        );

        Ok(result)
    }

    /// Fingerprint cache misses, results in input order.
    fn compute_parallel(
        &self,
        misses: &[&PhotoFile],
        events: &EventSender,
    ) -> Result<Vec<Result<Fingerprint, HashError>>, SnapMatchError> {
        let total = misses.len();
        let completed = AtomicUsize::new(0);

        let task = |photo: &&PhotoFile| {
            let result = self.fingerprint_one(photo, events);
            let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Fingerprint(FingerprintEvent::Progress(
                FingerprintProgress {
                    set: InputSet::Reference,
                    completed: current,
                    total,
                    current_path: photo.path.clone(),
                },
            )));
            result
        };

        if self.config.workers == 1 || total <= 1 {
            return Ok(misses.iter().map(task).collect());
        }

        let mut pool = rayon::ThreadPoolBuilder::new();
        if self.config.workers > 0 {
            pool = pool.num_threads(self.config.workers);
        }
        let pool = pool
            .build()
            .map_err(|e| SnapMatchError::Config(format!("cannot start worker pool: {e}")))?;

        Ok(pool.install(|| misses.par_iter().map(task).collect()))
    }

    fn fingerprint_one(
        &self,
        photo: &PhotoFile,
        events: &EventSender,
    ) -> Result<Fingerprint, HashError> {
        self.fingerprinter.fingerprint_file(&photo.path).inspect_err(|e| {
            tracing::debug!("excluding {}: {}", photo.path.display(), e);
            events.send(Event::Fingerprint(FingerprintEvent::Failed {
                path: photo.path.clone(),
                message: e.to_string(),
            }));
        })
    }
}

fn check_root(root: &Path) -> Result<(), SnapMatchError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        }
        .into())
    }
}
