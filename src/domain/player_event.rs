// src/domain/player_event.rs
//
// Canonical player events.
//
// CRITICAL RULES:
// - Produced only by player adapters
// - Immutable once constructed
// - ts is the capture time on the adapter clock, not the delivery time

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a canonical player event.
///
/// Names follow the HTML media event vocabulary; backends that report
/// something outside of it map to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Abort,
    CanPlay,
    CanPlayThrough,
    DurationChange,
    Emptied,
    Ended,
    Error,
    LoadedData,
    LoadedMetadata,
    LoadStart,
    Pause,
    Play,
    Playing,
    Progress,
    RateChange,
    Seeked,
    Seeking,
    Stalled,
    Suspend,
    TimeUpdate,
    VolumeChange,
    Waiting,
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "abort" => EventKind::Abort,
            "canplay" => EventKind::CanPlay,
            "canplaythrough" => EventKind::CanPlayThrough,
            "durationchange" => EventKind::DurationChange,
            "emptied" => EventKind::Emptied,
            "ended" => EventKind::Ended,
            "error" => EventKind::Error,
            "loadeddata" => EventKind::LoadedData,
            "loadedmetadata" => EventKind::LoadedMetadata,
            "loadstart" => EventKind::LoadStart,
            "pause" => EventKind::Pause,
            "play" => EventKind::Play,
            "playing" => EventKind::Playing,
            "progress" => EventKind::Progress,
            "ratechange" => EventKind::RateChange,
            "seeked" => EventKind::Seeked,
            "seeking" => EventKind::Seeking,
            "stalled" => EventKind::Stalled,
            "suspend" => EventKind::Suspend,
            "timeupdate" => EventKind::TimeUpdate,
            "volumechange" => EventKind::VolumeChange,
            "waiting" => EventKind::Waiting,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Abort => "abort",
            EventKind::CanPlay => "canplay",
            EventKind::CanPlayThrough => "canplaythrough",
            EventKind::DurationChange => "durationchange",
            EventKind::Emptied => "emptied",
            EventKind::Ended => "ended",
            EventKind::Error => "error",
            EventKind::LoadedData => "loadeddata",
            EventKind::LoadedMetadata => "loadedmetadata",
            EventKind::LoadStart => "loadstart",
            EventKind::Pause => "pause",
            EventKind::Play => "play",
            EventKind::Playing => "playing",
            EventKind::Progress => "progress",
            EventKind::RateChange => "ratechange",
            EventKind::Seeked => "seeked",
            EventKind::Seeking => "seeking",
            EventKind::Stalled => "stalled",
            EventKind::Suspend => "suspend",
            EventKind::TimeUpdate => "timeupdate",
            EventKind::VolumeChange => "volumechange",
            EventKind::Waiting => "waiting",
            EventKind::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        EventKind::from_name(&name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A normalized player occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Capture time in milliseconds on the adapter clock
    pub ts: u64,
    /// Playback position in seconds at capture time
    pub current_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PlayerEvent {
    pub fn new(kind: EventKind, ts: u64, current_time: f64) -> Self {
        Self {
            kind,
            ts,
            current_time,
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>, ts: u64, current_time: f64) -> Self {
        Self {
            kind: EventKind::Error,
            ts,
            current_time,
            error_message: Some(message.into()),
        }
    }
}
