// src/services/mod.rs
//
// Services Module - Monitor engine

pub mod monitor;
pub(crate) mod watchers;

pub use monitor::{
    ErrorPolicy,
    InertErrorPolicy,
    Monitor,
    MonitorState,
    SessionInfo,
    MULTI_WAITING_DELAY,
};

pub use watchers::WAITING_WINDOW_CAPACITY;
