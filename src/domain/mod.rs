// src/domain/mod.rs
//
// Domain Root - canonical events, signals, watcher kinds and thresholds.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod player_event;
pub mod signal;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{MonitorConfig, MonitorOptions};
pub use player_event::{EventKind, PlayerEvent};
pub use signal::{QoeSignal, WatcherKind};
