// src/lib.rs
// Vidmon - Video playback QoE monitor
//
// Architecture:
// - Adapters: every player backend is reduced to canonical PlayerEvents
// - Monitor: timer-driven watchers turn event patterns into QoE signals
// - Explicit: the monitor observes, it never controls playback
// - Deterministic: all timing goes through an injectable Clock

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;

// ============================================================================
// PLAYERS AND ENGINE
// ============================================================================

pub mod integrations;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{EventKind, MonitorConfig, MonitorOptions, PlayerEvent, QoeSignal, WatcherKind};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{VidmonError, VidmonResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{EventLog, EventLogEntry, LogRecord, SignalBus, SignalLogEntry};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{Clock, LogLevel, ManualClock, TimerHandle, TokioClock};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    AdapterKind,
    AvPlayAdapter,
    AvPlayApi,
    AvPlayListener,
    AvPlayState,
    ElementAdapter,
    EventHandler,
    MediaElement,
    NativeListener,
    PlayerAdapter,
    MEDIA_EVENTS,
};

// ============================================================================
// PUBLIC API - Monitor
// ============================================================================

pub use services::{ErrorPolicy, InertErrorPolicy, Monitor, MonitorState, SessionInfo};
