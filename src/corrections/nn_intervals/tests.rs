use tempfile::tempdir;

use super::*;

fn series(rows: usize) -> NnSection {
    NnSection {
        metadata: NnSectionMetadata {
            correction_method: Some("kubios".into()),
            corrected_at: Some("2026-01-18T14:55:00".into()),
            original_beat_count: Some(rows + 1),
            artifacts_removed: Some(1),
            intervals_corrected: Some(1),
            final_nn_count: Some(rows),
            corrections: vec![IntervalCorrection {
                nn_idx: 1,
                original_rr_ms: 1250.0,
                corrected_nn_ms: 855.0,
            }],
            csv_file: None,
        },
        intervals: (0..rows)
            .map(|idx| NnInterval {
                elapsed_ms: idx as i64 * 850,
                interval_ms: 850.0 + idx as f64 * 0.5,
                was_interpolated: idx == 1,
            })
            .collect(),
    }
}

fn locations(root: &Path) -> StoreLocations {
    StoreLocations::new(root.join("global")).with_data_dir(root.join("data/raw"))
}

#[test]
fn section_round_trip_preserves_rows_in_order() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let saved = series(5);
    let csv_path = save_section(&locations, "P01", "rest_pre", saved.clone()).unwrap();
    assert_eq!(csv_path, dir.path().join("data/processed/P01_rest_pre_nn.csv"));
    assert!(dir.path().join("data/processed/P01_nn_metadata.yml").exists());

    let loaded = load_section(&locations, "P01", "rest_pre");
    assert!(loaded.is_clean());
    let section = loaded.into_value().unwrap();
    assert_eq!(section.intervals, saved.intervals);
    assert_eq!(section.metadata.corrections, saved.metadata.corrections);
    assert_eq!(
        section.metadata.csv_file.as_deref(),
        Some("P01_rest_pre_nn.csv")
    );
}

#[test]
fn saving_a_section_keeps_other_sections() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    save_section(&locations, "P01", "rest_pre", series(3)).unwrap();
    save_section(&locations, "P01", "music_1", series(4)).unwrap();

    let all = load_all(&locations, "P01").into_value().unwrap();
    assert_eq!(all.stored_version, FormatVersion::new(2, 0));
    assert_eq!(all.sections["rest_pre"].intervals.len(), 3);
    assert_eq!(all.sections["music_1"].intervals.len(), 4);
    assert!(all.created_at.is_some());
    assert_eq!(
        list_sections(&locations, "P01").value,
        Some(vec!["music_1".to_string(), "rest_pre".to_string()])
    );
}

#[test]
fn missing_rows_file_yields_empty_intervals_with_warning() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let csv_path = save_section(&locations, "P01", "rest_pre", series(3)).unwrap();
    fs::remove_file(&csv_path).unwrap();

    let loaded = load_section(&locations, "P01", "rest_pre");
    assert_eq!(loaded.warnings.len(), 1);
    let section = loaded.into_value().unwrap();
    assert!(section.intervals.is_empty());
    assert_eq!(section.metadata.final_nn_count, Some(3));
}

#[test]
fn summary_falls_back_to_row_count() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let mut section = series(4);
    section.metadata.final_nn_count = None;
    section.metadata.correction_method = None;
    save_section(&locations, "P01", "music_1", section).unwrap();

    let summary = summary(&locations, "P01").into_value().unwrap();
    let music = &summary["music_1"];
    assert_eq!(music.nn_count, 4);
    assert_eq!(music.correction_method, "unknown");
    assert_eq!(music.intervals_corrected, 1);
}

#[test]
fn legacy_inline_file_is_read_and_converted_on_save() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let processed = dir.path().join("data/processed");
    fs::create_dir_all(&processed).unwrap();
    fs::write(
        processed.join("P02_nn_intervals.yml"),
        "format_version: '1.0'\nsections:\n  rest_pre:\n    correction_method: none\n    intervals:\n      - [0, 800, false]\n      - [800, 810, false]\n",
    )
    .unwrap();

    let legacy = load_all(&locations, "P02").into_value().unwrap();
    assert_eq!(legacy.stored_version, FormatVersion::new(1, 0));
    assert_eq!(legacy.sections["rest_pre"].intervals.len(), 2);

    save_section(&locations, "P02", "music_1", series(2)).unwrap();
    assert!(!processed.join("P02_nn_intervals.yml").exists());
    assert!(processed.join("P02_rest_pre_nn.csv").exists());
    let upgraded = load_all(&locations, "P02").into_value().unwrap();
    assert_eq!(upgraded.stored_version, FormatVersion::new(2, 0));
    assert_eq!(upgraded.sections["rest_pre"].intervals[1].interval_ms, 810.0);
    assert_eq!(upgraded.sections["music_1"].intervals.len(), 2);
}

#[test]
fn global_legacy_file_is_a_read_fallback() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let global = dir.path().join("global");
    fs::create_dir_all(&global).unwrap();
    fs::write(
        global.join("P03_nn_intervals.yml"),
        "sections:\n  _full:\n    intervals: [[0, 900, true]]\n",
    )
    .unwrap();

    let section = load_section(&locations, "P03", "_full").into_value().unwrap();
    assert!(section.intervals[0].was_interpolated);
}

#[test]
fn delete_single_section_keeps_the_rest() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    save_section(&locations, "P04", "rest_pre", series(2)).unwrap();
    let music_csv = save_section(&locations, "P04", "music_1", series(2)).unwrap();

    assert!(delete(&locations, "P04", Some("music_1")).unwrap());
    assert!(!music_csv.exists());
    assert_eq!(
        list_sections(&locations, "P04").value,
        Some(vec!["rest_pre".to_string()])
    );
    assert!(!delete(&locations, "P04", Some("music_1")).unwrap());
}

#[test]
fn delete_all_removes_rows_and_metadata() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let rest_csv = save_section(&locations, "P05", "rest_pre", series(2)).unwrap();
    let global = dir.path().join("global");
    fs::create_dir_all(&global).unwrap();
    fs::write(global.join("P05_nn_intervals.yml"), "sections: {}\n").unwrap();

    assert!(delete(&locations, "P05", None).unwrap());
    assert!(!rest_csv.exists());
    assert!(!global.join("P05_nn_intervals.yml").exists());
    assert_eq!(load_all(&locations, "P05").value, None);
    assert!(!delete(&locations, "P05", None).unwrap());
}

#[test]
fn unparsable_row_is_reported_as_warning() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let csv_path = save_section(&locations, "P06", "rest_pre", series(3)).unwrap();
    fs::write(
        &csv_path,
        "beat_idx,timestamp_ms,nn_ms,was_corrected\n0,0,850.0,false\n1,850,GARBAGE,true\n2,1700,851.0,false\n",
    )
    .unwrap();

    let loaded = load_section(&locations, "P06", "rest_pre");
    assert!(!loaded.is_clean());
    assert_eq!(loaded.warnings.len(), 1);
    assert_eq!(loaded.warnings[0].path, csv_path);
    assert!(loaded.warnings[0].message.contains('1'));
    assert_eq!(loaded.into_value().unwrap().intervals.len(), 2);
}

#[test]
fn delete_all_removes_unlisted_rows_when_metadata_is_corrupt() {
    let dir = tempdir().unwrap();
    let locations = locations(dir.path());
    let rest_csv = save_section(&locations, "P07", "rest_pre", series(2)).unwrap();
    let music_csv = save_section(&locations, "P07", "music_1", series(2)).unwrap();
    let processed = locations.write_dir();
    fs::write(processed.join(metadata_file_name("P07")), "sections: [unclosed").unwrap();
    let other = save_section(&locations, "P070", "rest_pre", series(1)).unwrap();

    assert!(delete(&locations, "P07", None).unwrap());
    assert!(!rest_csv.exists());
    assert!(!music_csv.exists());
    assert!(!processed.join(metadata_file_name("P07")).exists());
    assert!(other.exists());
}
