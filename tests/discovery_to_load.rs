mod support;

use rrational::recordings::{
    DiscoveryOptions, IdentityPattern, RecordingError, discover_recordings, load_recording,
    load_recordings_from_directory,
};
use support::recordings::{write_beat_file, write_event_file};
use tempfile::tempdir;

fn participant_options() -> DiscoveryOptions {
    DiscoveryOptions::with_pattern(
        IdentityPattern::new(r"(?P<participant>P\d+)").expect("valid pattern"),
    )
}

#[test]
fn nested_exports_are_paired_and_loaded_in_participant_order() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_beat_file(&root.join("session_b"), "P02_RR.csv", &[812.0, 799.6, 805.4]);
    write_event_file(&root.join("session_b"), "P02_Events.csv", &[(0.0, "rest_pre_start"), (300.0, "rest_pre_end")]);
    write_beat_file(&root.join("session_a"), "P01_RR.csv", &[900.0, 910.0]);
    write_event_file(&root.join("session_a"), "P03_Events.csv", &[(0.0, "orphan")]);
    std::fs::write(root.join("notes.txt"), "P04 RR").unwrap();

    let bundles = discover_recordings(root, &participant_options());
    let ids: Vec<_> = bundles.iter().map(|b| b.participant_id.as_str()).collect();
    assert_eq!(ids, ["P01", "P02"]);
    assert!(bundles[0].event_file_path.is_none());
    assert!(bundles[1].event_file_path.is_some());

    let recordings = load_recordings_from_directory(root, &participant_options()).unwrap();
    assert_eq!(recordings.len(), 2);
    assert_eq!(recordings[0].beats.len(), 2);
    assert!(recordings[0].events.is_empty());

    let p02 = &recordings[1];
    let durations: Vec<_> = p02.beats.iter().map(|beat| beat.duration_ms).collect();
    assert_eq!(durations, [812, 800, 805]);
    assert!(p02.beats.iter().all(|beat| beat.timestamp.is_some()));
    assert_eq!(p02.events[1].label, "rest_pre_end");
    assert_eq!(p02.events[1].offset_s, Some(300.0));
}

#[test]
fn missing_root_discovers_nothing() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("not_there");
    assert!(discover_recordings(&missing, &participant_options()).is_empty());
    assert!(
        load_recordings_from_directory(&missing, &participant_options())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn deleted_beat_file_fails_the_load() {
    let dir = tempdir().unwrap();
    write_beat_file(dir.path(), "P05_RR.csv", &[800.0]);
    let bundle = discover_recordings(dir.path(), &participant_options())
        .into_iter()
        .next()
        .unwrap();
    std::fs::remove_file(&bundle.beat_file_path).unwrap();

    let err = load_recording(&bundle).unwrap_err();
    assert!(matches!(err, RecordingError::MissingBeatFile(path) if path == bundle.beat_file_path));
}
