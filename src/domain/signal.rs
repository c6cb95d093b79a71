// src/domain/signal.rs
//
// QoE signals and the watchers that raise them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quality-of-experience problem detected by the monitor.
///
/// Signals carry no payload; consumers that need context read the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QoeSignal {
    /// No forward progress within the join-time threshold after `play`
    LongJoinTime,
    /// No `timeupdate` within the stall threshold
    VisualStall,
    /// Still buffering after the play-after-waiting threshold
    LongWaitingTime,
    /// Repeated buffering inside the waiting-repeat window
    MultiWaitingInRow,
}

impl QoeSignal {
    pub const ALL: [QoeSignal; 4] = [
        QoeSignal::LongJoinTime,
        QoeSignal::VisualStall,
        QoeSignal::LongWaitingTime,
        QoeSignal::MultiWaitingInRow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QoeSignal::LongJoinTime => "long-join-time",
            QoeSignal::VisualStall => "visual-stall",
            QoeSignal::LongWaitingTime => "long-waiting-time",
            QoeSignal::MultiWaitingInRow => "multi-waiting-in-row",
        }
    }
}

impl fmt::Display for QoeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named countdown tracking one heuristic's pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatcherKind {
    JoinTime,
    RealStall,
    MultiWaiting,
    PlayAfterWaiting,
}

impl WatcherKind {
    pub fn description(&self) -> &'static str {
        match self {
            WatcherKind::JoinTime => "Join Time",
            WatcherKind::RealStall => "Visual Stalling",
            WatcherKind::MultiWaiting => "Multiple waitings in a row",
            WatcherKind::PlayAfterWaiting => "Play after waiting",
        }
    }
}

impl fmt::Display for WatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
