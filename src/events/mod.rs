// src/events/mod.rs
//
// Monitor output - Public API
//
// - bus: QoE signals fanned out to subscribers
// - event_log: append-only record of observed player events

pub mod bus;
pub mod event_log;

pub use bus::{SignalBus, SignalLogEntry};
pub use event_log::{EventLog, EventLogEntry, LogRecord};
