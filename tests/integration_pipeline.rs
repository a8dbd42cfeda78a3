//! Integration tests for the pipeline module.
//!
//! These tests verify end-to-end pipeline behavior including:
//! - The two-bit edit scenario at two thresholds
//! - Cache reuse and invalidation across runs
//! - Tie-breaking that ignores which raw files came from the cache
//! - Agreement with caches written by Pillow-based tools
//! - Identical output for any worker count
//! - Exclusion of undecodable files

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use snapmatch::core::cache::{self, CsvCacheStore, FingerprintCache};
use snapmatch::core::hasher::{DifferenceHasher, Fingerprint, Fingerprinter};
use snapmatch::core::matcher::MatchStatus;
use snapmatch::core::pipeline::Pipeline;
use snapmatch::core::scanner::FileIdentity;
use snapmatch::error::{HashError, InputSet, SnapMatchError};
use snapmatch::events::null_sender;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// dHash that counts how many images it actually fingerprinted
struct CountingFingerprinter {
    calls: Arc<AtomicUsize>,
}

impl Fingerprinter for CountingFingerprinter {
    fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DifferenceHasher.fingerprint_image(image)
    }

    fn name(&self) -> &'static str {
        "counting dHash"
    }
}

struct Fixture {
    _temp: TempDir,
    raw: PathBuf,
    edited: PathBuf,
    cache: PathBuf,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let raw = temp.path().join("raw");
    let edited = temp.path().join("edited");
    fs::create_dir_all(&raw).unwrap();
    fs::create_dir_all(&edited).unwrap();
    let cache = temp.path().join("out").join("snapmatch_cache.csv");
    Fixture {
        _temp: temp,
        raw,
        edited,
        cache,
    }
}

/// Write a grayscale PNG; 9x8 images keep their exact pixels through the
/// fingerprint resize.
fn write_png(path: &Path, width: u32, height: u32, pixel: impl Fn(u32, u32) -> u8) {
    let gray = GrayImage::from_fn(width, height, |x, y| Luma([pixel(x, y)]));
    let image = DynamicImage::ImageLuma8(gray);
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

fn pattern(path: &Path, seed: u32) {
    write_png(path, 36, 32, move |x, y| ((x * (seed + 3) + y * (seed * 5 + 1)) % 251) as u8);
}

fn bump_mtime(path: &Path) {
    set_mtime_ahead(path, 3600);
}

fn set_mtime_ahead(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs)).unwrap();
}

fn counting_pipeline(f: &Fixture, calls: &Arc<AtomicUsize>) -> Pipeline {
    Pipeline::builder()
        .raw_dir(&f.raw)
        .edited_dir(&f.edited)
        .cache(Box::new(CsvCacheStore::new(&f.cache)))
        .fingerprinter(Box::new(CountingFingerprinter {
            calls: Arc::clone(calls),
        }))
        .build()
        .unwrap()
}

#[test]
fn two_bit_edit_matches_at_three_but_not_at_one() {
    let f = fixture();
    let r = f.raw.join("R.png");
    write_png(&r, 9, 8, |_, _| 128);
    write_png(&f.edited.join("E.png"), 9, 8, |x, y| {
        if x == 4 && (y == 0 || y == 7) {
            200
        } else {
            128
        }
    });
    let r = r.canonicalize().unwrap();

    assert_eq!(DifferenceHasher.fingerprint_file(&r).unwrap(), Fingerprint::new(0));

    let run = |max_distance| {
        Pipeline::builder()
            .raw_dir(&f.raw)
            .edited_dir(&f.edited)
            .max_distance(max_distance)
            .build()
            .unwrap()
            .run()
            .unwrap()
    };

    let lenient = run(3);
    assert_eq!(lenient.outcomes.len(), 1);
    assert_eq!(lenient.outcomes[0].status, MatchStatus::Matched);
    assert_eq!(lenient.outcomes[0].matched_path.as_deref(), Some(r.as_path()));
    assert_eq!(lenient.outcomes[0].distance, Some(2));

    let strict = run(1);
    assert_eq!(strict.outcomes[0].status, MatchStatus::NoMatch);
    assert_eq!(strict.outcomes[0].matched_path.as_deref(), Some(r.as_path()));
    assert_eq!(strict.outcomes[0].distance, Some(2));
}

#[test]
fn unchanged_raw_files_are_not_fingerprinted_again() {
    let f = fixture();
    for seed in 0..4 {
        pattern(&f.raw.join(format!("raw_{seed}.png")), seed);
    }
    pattern(&f.edited.join("edit.png"), 2);

    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = counting_pipeline(&f, &calls);

    let first = pipeline.run().unwrap();
    // Four raw files plus one edited file.
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(first.summary.cache_hits, 0);
    assert_eq!(cache::load(&f.cache).len(), 4);

    calls.store(0, Ordering::SeqCst);
    let second = pipeline.run().unwrap();
    // Only the edited file: queries are never cached.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.summary.cache_hits, 4);
    assert_eq!(second.outcomes, first.outcomes);
}

#[test]
fn changed_identity_forces_recomputation() {
    let f = fixture();
    let touched = f.raw.join("touched.png");
    let resized = f.raw.join("resized.png");
    pattern(&touched, 1);
    pattern(&resized, 2);
    pattern(&f.raw.join("untouched.png"), 3);
    pattern(&f.edited.join("edit.png"), 1);

    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = counting_pipeline(&f, &calls);
    pipeline.run().unwrap();

    // Same size, new mtime.
    bump_mtime(&touched);
    // New content and size.
    write_png(&resized, 20, 20, |x, _| (x * 12) as u8);

    calls.store(0, Ordering::SeqCst);
    let result = pipeline.run().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.summary.cache_hits, 1);

    let stored = cache::load(&f.cache);
    let key = resized.canonicalize().unwrap();
    let entry = stored.get(&key.to_string_lossy()).unwrap();
    assert_eq!(entry.size, fs::metadata(&resized).unwrap().len());
    assert_eq!(
        entry.fingerprint,
        DifferenceHasher.fingerprint_file(&resized).unwrap()
    );
}

#[test]
fn stale_cache_entry_is_overwritten() {
    let f = fixture();
    let raw = f.raw.join("a.png");
    pattern(&raw, 4);
    pattern(&f.edited.join("edit.png"), 4);
    let canonical = raw.canonicalize().unwrap();

    // A cache row for the right path but the wrong identity.
    let mut seeded = FingerprintCache::new();
    seeded.insert(
        canonical.to_string_lossy(),
        cache::CacheEntry {
            mtime_ns: 1,
            size: 1,
            fingerprint: Fingerprint::new(0xDEAD_BEEF),
        },
    );
    cache::save(&f.cache, &seeded).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let result = counting_pipeline(&f, &calls).run().unwrap();

    assert_eq!(result.summary.cache_hits, 0);
    assert_eq!(result.outcomes[0].distance, Some(0));
    let entry = *cache::load(&f.cache).get(&canonical.to_string_lossy()).unwrap();
    assert_ne!(entry.fingerprint, Fingerprint::new(0xDEAD_BEEF));
    assert_eq!(entry.size, fs::metadata(&raw).unwrap().len());
}

#[test]
fn ties_go_to_the_first_raw_file_whatever_the_cache_holds() {
    let f = fixture();
    let a = f.raw.join("a.png");
    let b = f.raw.join("b.png");
    pattern(&a, 6);
    pattern(&b, 6);
    pattern(&f.edited.join("edit.png"), 6);
    let a = a.canonicalize().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let first = counting_pipeline(&f, &calls).run().unwrap();
    assert_eq!(first.outcomes[0].matched_path.as_deref(), Some(a.as_path()));

    // `a` now misses the cache while `b` is still a hit.
    for (round, workers) in [1, 4].into_iter().enumerate() {
        set_mtime_ahead(&a, 3600 * (round as u64 + 1));

        let result = Pipeline::builder()
            .raw_dir(&f.raw)
            .edited_dir(&f.edited)
            .workers(workers)
            .cache(Box::new(CsvCacheStore::new(&f.cache)))
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(result.summary.cache_hits, 1, "workers = {workers}");
        assert_eq!(result.outcomes[0].distance, Some(0));
        assert_eq!(
            result.outcomes[0].matched_path.as_deref(),
            Some(a.as_path()),
            "workers = {workers}"
        );
    }
}

#[test]
fn legacy_dhash_cache_agrees_with_fresh_fingerprints() {
    let f = fixture();
    // Pillow's convert("L") makes blue (29) brighter than dark red (27).
    let stripes = RgbImage::from_fn(9, 8, |x, _| {
        if x % 2 == 0 {
            image::Rgb([0, 0, 255])
        } else {
            image::Rgb([90, 0, 0])
        }
    });
    let raw = f.raw.join("stripes.png");
    stripes.save_with_format(&raw, ImageFormat::Png).unwrap();
    stripes
        .save_with_format(f.edited.join("stripes_edit.png"), ImageFormat::Png)
        .unwrap();
    let raw = raw.canonicalize().unwrap();

    let pillow_dhash = 0x5555_5555_5555_5555_u64;
    let identity = FileIdentity::from_metadata(&fs::metadata(&raw).unwrap());
    fs::create_dir_all(f.cache.parent().unwrap()).unwrap();
    fs::write(
        &f.cache,
        format!(
            "path,mtime_ns,size,dhash\n{},{},{},{}\n",
            raw.display(),
            identity.mtime_ns,
            identity.size,
            pillow_dhash
        ),
    )
    .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let result = counting_pipeline(&f, &calls).run().unwrap();

    // Only the edited file is decoded; the raw value comes from the cache.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.summary.cache_hits, 1);
    assert_eq!(result.outcomes[0].query_fingerprint, Fingerprint::new(pillow_dhash));
    assert_eq!(result.outcomes[0].distance, Some(0));
    assert_eq!(result.outcomes[0].status, MatchStatus::Matched);
}

#[test]
fn corrupt_cache_file_is_ignored() {
    let f = fixture();
    pattern(&f.raw.join("a.png"), 1);
    pattern(&f.edited.join("edit.png"), 1);
    fs::create_dir_all(f.cache.parent().unwrap()).unwrap();
    fs::write(&f.cache, "this is,not\na cache\x00\x01").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let result = counting_pipeline(&f, &calls).run().unwrap();

    assert_eq!(result.summary.matched, 1);
    assert_eq!(cache::load(&f.cache).len(), 1);
}

#[test]
fn worker_count_does_not_change_results() {
    let f = fixture();
    for seed in 0..24 {
        let dir = f.raw.join(format!("batch_{}", seed % 3));
        fs::create_dir_all(&dir).unwrap();
        pattern(&dir.join(format!("img_{seed:02}.png")), seed);
    }
    fs::write(f.raw.join("batch_0").join("broken.jpg"), b"not a jpeg").unwrap();

    let reference_with = |workers| {
        Pipeline::builder()
            .raw_dir(&f.raw)
            .edited_dir(&f.edited)
            .workers(workers)
            .build()
            .unwrap()
            .fingerprint_reference(&null_sender())
            .unwrap()
    };

    let sequential = reference_with(1);
    assert_eq!(sequential.files.len(), 24);
    assert_eq!(sequential.failures.len(), 1);

    for workers in [0, 2, 8] {
        let parallel = reference_with(workers);
        assert_eq!(parallel.files, sequential.files, "workers = {workers}");
        assert_eq!(parallel.cache, sequential.cache, "workers = {workers}");
        assert_eq!(parallel.failures.len(), 1);
    }
}

#[test]
fn undecodable_files_are_excluded_without_aborting() {
    let f = fixture();
    pattern(&f.raw.join("good.png"), 7);
    fs::write(f.raw.join("bad.jpg"), b"\xFF\xD8\xFF garbage").unwrap();
    fs::write(f.raw.join("empty.png"), b"").unwrap();
    pattern(&f.edited.join("edit.png"), 7);
    fs::write(f.edited.join("bad.webp"), b"RIFF....").unwrap();

    let result = Pipeline::builder()
        .raw_dir(&f.raw)
        .edited_dir(&f.edited)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.summary.reference_files, 1);
    assert_eq!(result.summary.reference_failures, 2);
    assert_eq!(result.summary.query_failures, 1);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].status, MatchStatus::Matched);
}

#[test]
fn empty_sets_name_the_culprit() {
    let f = fixture();
    fs::write(f.raw.join("notes.txt"), b"not an image").unwrap();
    pattern(&f.edited.join("edit.png"), 1);

    let error = Pipeline::builder()
        .raw_dir(&f.raw)
        .edited_dir(&f.edited)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        error,
        SnapMatchError::EmptyInputSet {
            set: InputSet::Reference
        }
    ));
    assert!(error.to_string().contains("raw"));

    pattern(&f.raw.join("raw.png"), 1);
    fs::remove_file(f.edited.join("edit.png")).unwrap();

    let error = Pipeline::builder()
        .raw_dir(&f.raw)
        .edited_dir(&f.edited)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(error.to_string().contains("edited"));
}

#[test]
fn outcomes_follow_edited_enumeration_order() {
    let f = fixture();
    pattern(&f.raw.join("raw.png"), 1);
    for name in ["c.png", "a.png", "b.png"] {
        pattern(&f.edited.join(name), 1);
    }

    let result = Pipeline::builder()
        .raw_dir(&f.raw)
        .edited_dir(&f.edited)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let names: Vec<String> = result
        .outcomes
        .iter()
        .map(|o| o.query_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
}
