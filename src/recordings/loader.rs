//! Full parse of discovered bundles.

use std::path::Path;

use tracing::warn;

use super::discovery::{DiscoveryOptions, discover_recordings};
use super::parse::{load_beat_intervals, load_event_markers};
use super::{ParsedRecording, RecordingBundle, RecordingError};

/// Parse the beat file and, when still present, the event file of `bundle`.
///
/// A missing beat file is an error; a missing event file means no events.
pub fn load_recording(bundle: &RecordingBundle) -> Result<ParsedRecording, RecordingError> {
    if !bundle.beat_file_path.is_file() {
        return Err(RecordingError::MissingBeatFile(
            bundle.beat_file_path.clone(),
        ));
    }
    let beats = load_beat_intervals(&bundle.beat_file_path)?;
    let events = match bundle.event_file_path.as_deref() {
        Some(path) if path.is_file() => load_event_markers(path)?,
        Some(path) => {
            warn!(
                participant = %bundle.participant_id,
                path = %path.display(),
                "Event file vanished after discovery; loading without events"
            );
            Vec::new()
        }
        None => Vec::new(),
    };
    Ok(ParsedRecording {
        participant_id: bundle.participant_id.clone(),
        beats,
        events,
    })
}

/// Discover and load every recording under `root`, in participant order.
pub fn load_recordings_from_directory(
    root: &Path,
    options: &DiscoveryOptions,
) -> Result<Vec<ParsedRecording>, RecordingError> {
    discover_recordings(root, options)
        .iter()
        .map(load_recording)
        .collect()
}
