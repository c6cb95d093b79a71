// src/events/event_log.rs
//
// Append-only record of everything the monitor observed.
//
// CRITICAL RULES:
// - Entries are only ever appended, never removed or reordered
// - Read by the external reporting layer as a snapshot

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::PlayerEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    /// Synthetic entry written by `Monitor::start`
    MonitorStart,
    PlayerEvent { event: PlayerEvent },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub entry_id: Uuid,
    pub session_id: Uuid,
    /// Monitor clock time of the append, in milliseconds
    pub ts: u64,
    #[serde(flatten)]
    pub record: LogRecord,
}

impl EventLogEntry {
    pub fn is_monitor_start(&self) -> bool {
        matches!(self.record, LogRecord::MonitorStart)
    }

    pub fn player_event(&self) -> Option<&PlayerEvent> {
        match &self.record {
            LogRecord::PlayerEvent { event } => Some(event),
            LogRecord::MonitorStart => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&mut self, session_id: Uuid, ts: u64) -> &EventLogEntry {
        self.push(session_id, ts, LogRecord::MonitorStart)
    }

    pub fn record_event(&mut self, session_id: Uuid, ts: u64, event: PlayerEvent) -> &EventLogEntry {
        self.push(session_id, ts, LogRecord::PlayerEvent { event })
    }

    fn push(&mut self, session_id: Uuid, ts: u64, record: LogRecord) -> &EventLogEntry {
        let idx = self.entries.len();
        self.entries.push(EventLogEntry {
            entry_id: Uuid::new_v4(),
            session_id,
            ts,
            record,
        });
        &self.entries[idx]
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one monitoring session, in append order
    pub fn session(&self, session_id: Uuid) -> impl Iterator<Item = &EventLogEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.session_id == session_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}
