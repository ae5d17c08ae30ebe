//! Discovery and parsing of heartbeat-interval exports.
//!
//! Flow: [`discover_recordings`] pairs files per participant into
//! [`RecordingBundle`]s, and [`load_recording`] parses one bundle into a
//! [`ParsedRecording`] owned by the caller.

use std::path::PathBuf;

use serde::Serialize;
use time::OffsetDateTime;

pub mod csv_rows;
pub mod discovery;
mod errors;
pub mod identity;
pub mod loader;
pub mod parse;
pub mod timestamps;

pub use discovery::{
    DEFAULT_BEAT_FILE_MARKER, DEFAULT_EVENT_FILE_MARKER, DiscoveryOptions, discover_recordings,
};
pub use errors::RecordingError;
pub use identity::{DEFAULT_ID_PATTERN, IdentityPattern, UNKNOWN_PARTICIPANT};
pub use loader::{load_recording, load_recordings_from_directory};
pub use parse::{load_beat_intervals, load_event_markers};

/// One heartbeat-to-heartbeat gap.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatInterval {
    pub timestamp: Option<OffsetDateTime>,
    pub duration_ms: i64,
    /// Device-reported offset since the recording started.
    pub elapsed_ms: Option<i64>,
}

/// Annotation logged alongside a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMarker {
    pub label: String,
    pub timestamp: Option<OffsetDateTime>,
    /// Seconds from recording start.
    pub offset_s: Option<f64>,
}

/// Beat file plus optional event file found for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingBundle {
    pub participant_id: String,
    pub beat_file_path: PathBuf,
    pub event_file_path: Option<PathBuf>,
}

/// Fully parsed recording of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecording {
    pub participant_id: String,
    pub beats: Vec<BeatInterval>,
    pub events: Vec<EventMarker>,
}
