// src/integrations/avplay/mod.rs

pub mod adapter;
pub mod api;

pub use adapter::{AvPlayAdapter, DEFAULT_STATE_POLL_INTERVAL};
pub use api::{AvPlayApi, AvPlayListener, AvPlayState};
