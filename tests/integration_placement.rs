//! Integration tests for placing matched raw files and writing mapping.csv.

use assert_fs::prelude::*;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use predicates::prelude::*;
use snapmatch::core::matcher::MatchOutcome;
use snapmatch::core::pipeline::Pipeline;
use snapmatch::core::placement::{PlacementConfig, PlacementMode, PlacementRecord, Placer};
use snapmatch::core::reporter::{mapping_rows, write_mapping_file, MAPPING_FILE_NAME};
use std::path::Path;

fn write_png(path: &Path, seed: u32) {
    let image = DynamicImage::ImageLuma8(GrayImage::from_fn(27, 24, |x, y| {
        Luma([((x * (seed + 2) + y * (seed * 3 + 1)) % 241) as u8])
    }));
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

struct Layout {
    temp: assert_fs::TempDir,
}

impl Layout {
    /// raw/2024/trip/a.png, raw/b.png, raw/other/a.png
    /// edited/{a,b,c}_edit.png match them in that order, edited/lonely.png matches nothing
    fn new() -> Self {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("raw/2024/trip").create_dir_all().unwrap();
        temp.child("raw/other").create_dir_all().unwrap();
        temp.child("edited").create_dir_all().unwrap();

        write_png(temp.child("raw/2024/trip/a.png").path(), 1);
        write_png(temp.child("raw/b.png").path(), 2);
        write_png(temp.child("raw/other/a.png").path(), 3);

        write_png(temp.child("edited/a_edit.png").path(), 1);
        write_png(temp.child("edited/b_edit.png").path(), 2);
        write_png(temp.child("edited/c_edit.png").path(), 3);
        // Falls off left to right, so every bit is 0: far from all raw patterns.
        let dark = GrayImage::from_fn(27, 24, |x, _| Luma([255 - (x as u8) * 9]));
        DynamicImage::ImageLuma8(dark)
            .save_with_format(temp.child("edited/lonely.png").path(), ImageFormat::Png)
            .unwrap();

        Self { temp }
    }

    fn run(
        &self,
        mode: PlacementMode,
        preserve: bool,
        dry_run: bool,
    ) -> (Vec<MatchOutcome>, Vec<PlacementRecord>) {
        let raw = self.temp.child("raw");
        let result = Pipeline::builder()
            .raw_dir(raw.path())
            .edited_dir(self.temp.child("edited").path())
            .max_distance(3)
            .build()
            .unwrap()
            .run()
            .unwrap();

        let mut placer = Placer::new(PlacementConfig {
            out_dir: self.temp.child("out").path().to_path_buf(),
            raw_root: raw.path().to_path_buf(),
            mode,
            preserve_raw_subdirs: preserve,
            dry_run,
        });
        let (records, _) = placer.place_all(&result.outcomes);

        write_mapping_file(
            self.temp.child("out").child(MAPPING_FILE_NAME).path(),
            &mapping_rows(&result.outcomes, &records),
        )
        .unwrap();

        (result.outcomes, records)
    }
}

#[test]
fn copies_matched_originals_flat_with_unique_names() {
    let layout = Layout::new();
    let (outcomes, records) = layout.run(PlacementMode::Copy, false, false);

    assert_eq!(outcomes.len(), 4);
    let out = layout.temp.child("out");

    // Both raw files are named a.png: the second gets a suffix.
    out.child("a.png").assert(predicate::path::is_file());
    out.child("a__2.png").assert(predicate::path::is_file());
    out.child("b.png").assert(predicate::path::is_file());
    out.child("lonely.png").assert(predicate::path::missing());

    let placed = records.iter().filter(|r| r.copied_to.is_some()).count();
    assert_eq!(placed, 3);
    layout
        .temp
        .child("raw/2024/trip/a.png")
        .assert(predicate::path::is_file());
}

#[test]
fn preserves_raw_subdirectories() {
    let layout = Layout::new();
    layout.run(PlacementMode::Copy, true, false);

    let out = layout.temp.child("out");
    out.child("2024/trip/a.png").assert(predicate::path::is_file());
    out.child("other/a.png").assert(predicate::path::is_file());
    out.child("b.png").assert(predicate::path::is_file());
    out.child("a__2.png").assert(predicate::path::missing());
}

#[test]
fn dry_run_writes_only_the_report() {
    let layout = Layout::new();
    let (_, records) = layout.run(PlacementMode::Copy, false, true);

    let out = layout.temp.child("out");
    out.child("a.png").assert(predicate::path::missing());
    out.child("b.png").assert(predicate::path::missing());
    out.child(MAPPING_FILE_NAME).assert(predicate::path::is_file());

    // Destinations are still reported.
    assert_eq!(records.iter().filter(|r| r.copied_to.is_some()).count(), 3);
    out.child(MAPPING_FILE_NAME)
        .assert(predicate::str::contains(out.child("b.png").path().display().to_string()));
}

#[test]
fn mapping_report_lists_every_edited_photo() {
    let layout = Layout::new();
    layout.run(PlacementMode::Copy, false, false);

    let report = layout.temp.child("out").child(MAPPING_FILE_NAME);
    report.assert(predicate::str::starts_with(
        "edited,raw_match,distance,status,copied_to\n",
    ));
    report.assert(predicate::str::contains("a_edit.png"));
    report.assert(predicate::str::contains("lonely.png"));
    report.assert(predicate::str::contains(",no_match,\n"));

    let text = std::fs::read_to_string(report.path()).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert_eq!(text.matches(",matched,").count(), 3);
}

#[test]
fn hardlinks_share_the_raw_file() {
    let layout = Layout::new();
    layout.run(PlacementMode::Hardlink, false, false);

    let original = std::fs::read(layout.temp.child("raw/b.png").path()).unwrap();
    layout
        .temp
        .child("out/b.png")
        .assert(predicate::path::eq_file(layout.temp.child("raw/b.png").path()));
    assert_eq!(std::fs::read(layout.temp.child("out/b.png").path()).unwrap(), original);
}

#[cfg(unix)]
#[test]
fn symlinks_point_back_to_the_archive() {
    let layout = Layout::new();
    layout.run(PlacementMode::Symlink, false, false);

    let link = layout.temp.child("out/b.png");
    link.assert(predicate::path::is_symlink());
    let target = std::fs::read_link(link.path()).unwrap();
    assert_eq!(target, layout.temp.child("raw/b.png").path().canonicalize().unwrap());
}
