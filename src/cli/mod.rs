//! # CLI Module
//!
//! Command-line interface for SnapMatch.
//!
//! ## Usage
//! ```bash
//! # Match edited exports against a raw archive, copying the originals
//! snapmatch --raw ~/Archive --edited ~/Exports --out ~/Matched
//!
//! # Stricter matching, hardlinks, keep the archive's folder layout
//! snapmatch --raw ~/Archive --edited ~/Exports --out ~/Matched \
//!     --max-distance 1 --mode hardlink --preserve-raw-subdirs
//!
//! # Only write mapping.csv, print the summary as JSON
//! snapmatch --raw ~/Archive --edited ~/Exports --out ~/Matched --dry-run --output json
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use snapmatch::core::cache::{CacheStore, CsvCacheStore, DisabledCache, DEFAULT_CACHE_FILE_NAME};
use snapmatch::core::matcher::{MatchOutcome, MatchStatus};
use snapmatch::core::pipeline::Pipeline;
use snapmatch::core::placement::{PlacementConfig, PlacementMode, PlacementRecord, Placer};
use snapmatch::core::reporter::{mapping_rows, write_mapping_file, RunReport, MAPPING_FILE_NAME};
use snapmatch::core::scanner::ScanConfig;
use snapmatch::error::{Result, SnapMatchError};
use snapmatch::events::{Event, EventChannel, FingerprintEvent, MatchEvent, PipelineEvent};
use std::path::{Path, PathBuf};
use std::thread;

/// SnapMatch - find the raw originals of edited photos
#[derive(Parser, Debug)]
#[command(name = "snapmatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder with the raw/original photos
    #[arg(long, value_parser = existing_dir)]
    raw: PathBuf,

    /// Folder with the edited photos
    #[arg(long, value_parser = existing_dir)]
    edited: PathBuf,

    /// Output folder for matched raw files and reports
    #[arg(long)]
    out: PathBuf,

    /// Maximum Hamming distance for a match (0-64). Larger means fewer
    /// missed matches and more false ones
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=64))]
    max_distance: u32,

    /// Workers for fingerprinting raw photos (0 = one per CPU, 1 = sequential)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// How to place matched raw files: copy, hardlink or symlink
    #[arg(long, default_value = "copy", value_parser = parse_mode)]
    mode: PlacementMode,

    /// Fingerprint cache file [default: <OUT>/snapmatch_cache.csv]
    #[arg(long, conflicts_with = "no_cache")]
    cache: Option<PathBuf>,

    /// Neither read nor write a fingerprint cache
    #[arg(long)]
    no_cache: bool,

    /// Keep the raw folder's subdirectory structure inside the output folder
    #[arg(long)]
    preserve_raw_subdirs: bool,

    /// Only write the report, do not copy or link anything
    #[arg(long)]
    dry_run: bool,

    /// Include hidden files and folders
    #[arg(long)]
    include_hidden: bool,

    /// Image extensions to consider, comma separated
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

fn existing_dir(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("must be an existing folder: {value}"))
    }
}

fn parse_mode(value: &str) -> std::result::Result<PlacementMode, String> {
    value.parse().map_err(|e: snapmatch::error::PlacementError| e.to_string())
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    snapmatch::init_tracing(cli.verbose);
    run_match(cli)
}

fn run_match(cli: Cli) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(cli.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("SnapMatch").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    std::fs::create_dir_all(&cli.out).map_err(|e| {
        SnapMatchError::Config(format!("cannot create output folder {}: {}", cli.out.display(), e))
    })?;

    // Set up cache
    let cache_path = if cli.no_cache {
        None
    } else {
        Some(
            cli.cache
                .clone()
                .unwrap_or_else(|| cli.out.join(DEFAULT_CACHE_FILE_NAME)),
        )
    };
    let cache: Box<dyn CacheStore> = match &cache_path {
        Some(path) => Box::new(CsvCacheStore::new(path)),
        None => Box::new(DisabledCache),
    };

    let scan_config = ScanConfig {
        include_hidden: cli.include_hidden,
        extensions: cli.extensions.clone(),
        ..ScanConfig::default()
    };

    // Build pipeline
    let pipeline = Pipeline::builder()
        .raw_dir(&cli.raw)
        .edited_dir(&cli.edited)
        .max_distance(cli.max_distance)
        .workers(cli.workers)
        .scan_config(scan_config)
        .cache(cache)
        .build()?;

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
        if let Ok(bar_style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = cli.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so senders never hold events nobody reads.
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Fingerprint(FingerprintEvent::Started { total, .. }) => {
                    pb.set_length(total as u64);
                    pb.set_position(0);
                }
                Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} {}",
                            p.set,
                            p.current_path.file_name().unwrap_or_default().to_string_lossy()
                        ));
                    }
                }
                Event::Fingerprint(FingerprintEvent::Failed { path, .. }) => {
                    if verbose {
                        pb.println(format!(
                            "  {} {}",
                            style("skipped").yellow(),
                            display_path(&path)
                        ));
                    }
                }
                Event::Match(MatchEvent::Started { queries, .. }) => {
                    pb.set_length(queries as u64);
                    pb.set_position(0);
                }
                Event::Match(MatchEvent::Progress { completed, .. }) => {
                    pb.set_position(completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let result = result?;

    // Place matched raw files
    let mut placer = Placer::new(PlacementConfig {
        out_dir: cli.out.clone(),
        raw_root: cli.raw.clone(),
        mode: cli.mode,
        preserve_raw_subdirs: cli.preserve_raw_subdirs,
        dry_run: cli.dry_run,
    });
    let (placements, placement_summary) = placer.place_all(&result.outcomes);

    // Reports
    let report_path = cli.out.join(MAPPING_FILE_NAME);
    write_mapping_file(&report_path, &mapping_rows(&result.outcomes, &placements))?;

    let mut errors = result.errors;
    errors.extend(placements.iter().filter_map(|p| p.error.clone()));

    let report = RunReport {
        summary: result.summary,
        placement: placement_summary,
        report: report_path,
        cache: cache_path,
        max_distance: cli.max_distance,
        errors,
    };

    // Output results
    match cli.output {
        OutputFormat::Pretty => print_pretty_results(
            &term,
            &report,
            &result.outcomes,
            &placements,
            cli.mode,
            cli.verbose,
        ),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

fn print_pretty_results(
    term: &Term,
    report: &RunReport,
    outcomes: &[MatchOutcome],
    placements: &[PlacementRecord],
    mode: PlacementMode,
    verbose: bool,
) {
    let summary = &report.summary;

    if verbose {
        for (outcome, placement) in outcomes.iter().zip(placements) {
            let (marker, target) = match (outcome.status, &outcome.matched_path) {
                (MatchStatus::Matched, Some(raw)) => (style("✓").green(), display_path(raw)),
                (_, Some(raw)) => (style("✗").red(), format!("nearest {}", display_path(raw))),
                (_, None) => (style("✗").red(), String::from("no candidate")),
            };
            let distance = outcome
                .distance
                .map(|d| format!(" (distance {d})"))
                .unwrap_or_default();

            term.write_line(&format!(
                "  {} {} -> {}{}",
                marker,
                display_path(&outcome.query_path),
                target,
                style(distance).dim()
            ))
            .ok();
            if let Some(error) = &placement.error {
                term.write_line(&format!("      {}", style(error).red())).ok();
            }
        }
        term.write_line("").ok();
    }

    term.write_line(&format!("{} Done", style("✓").green().bold())).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} matched, {} not matched (max distance {}) in {:.1}s",
        style(summary.matched).green(),
        style(summary.unmatched).yellow(),
        report.max_distance,
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} raw and {} edited photos fingerprinted",
        style(summary.reference_files).cyan(),
        style(summary.query_files).cyan()
    ))
    .ok();

    let failures = report.decode_failures();
    let failures = if failures > 0 {
        style(failures).yellow()
    } else {
        style(failures).dim()
    };
    term.write_line(&format!(
        "  {} unreadable files skipped ({} raw, {} edited)",
        failures, summary.reference_failures, summary.query_failures
    ))
    .ok();

    if summary.cache_hits > 0 {
        term.write_line(&format!("  {} cache hits", style(summary.cache_hits).dim())).ok();
    }

    let placement = &report.placement;
    if placement.dry_run {
        term.write_line(&format!(
            "  {} files would be placed ({})",
            style(placement.placed).cyan(),
            style("dry run").dim()
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "  {} files placed ({})",
            style(placement.placed).cyan(),
            mode
        ))
        .ok();
    }
    if placement.failed > 0 {
        term.write_line(&format!(
            "  {} files could not be placed",
            style(placement.failed).red()
        ))
        .ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "  {} {}",
        style("Report:").bold(),
        display_path(&report.report)
    ))
    .ok();
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(relative) => format!("~/{}", relative.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["snapmatch", "--raw", root, "--edited", root, "--out", root])
            .unwrap();

        assert_eq!(cli.max_distance, 3);
        assert_eq!(cli.workers, 0);
        assert_eq!(cli.mode, PlacementMode::Copy);
        assert!(cli.cache.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let base = ["snapmatch", "--raw", root, "--edited", root, "--out", root];

        let with = |extra: &[&str]| {
            let args: Vec<&str> = base.iter().chain(extra).copied().collect();
            Cli::try_parse_from(args)
        };

        assert!(with(&["--max-distance", "65"]).is_err());
        assert!(with(&["--mode", "move"]).is_err());
        assert!(with(&["--cache", "c.csv", "--no-cache"]).is_err());
        let missing_raw = [
            "snapmatch",
            "--raw",
            "/nonexistent/snapmatch",
            "--edited",
            root,
            "--out",
            root,
        ];
        assert!(Cli::try_parse_from(missing_raw).is_err());
    }

    #[test]
    fn extensions_are_comma_separated() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "snapmatch", "--raw", root, "--edited", root, "--out", root, "--extensions", "jpg,PNG",
        ])
        .unwrap();

        assert_eq!(cli.extensions, Some(vec!["jpg".to_string(), "PNG".to_string()]));
    }
}
