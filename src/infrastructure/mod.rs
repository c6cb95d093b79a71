// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Time and diagnostics that support the monitor but are not part of its
// heuristics.
//
// RULES:
// - The monitor never reads wall-clock time for watcher deadlines
// - Clocks are replaceable (tokio in production, manual in tests)

pub mod clock;
pub mod logging;

pub use clock::{Clock, ManualClock, TimerCallback, TimerHandle, TokioClock};
pub use logging::{LogLevel, LOG_TARGET};
