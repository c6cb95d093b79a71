// src/integrations/avplay/api.rs
//
// Native AV playback API surface (Tizen-style avplay).
//
// The native player has no play/pause callbacks; its state is inspectable
// only through `state()`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvPlayState {
    None,
    Idle,
    Ready,
    Playing,
    Paused,
}

/// Lifecycle callbacks registered with the native player
#[derive(Clone)]
pub struct AvPlayListener {
    pub on_buffering_start: Arc<dyn Fn() + Send + Sync>,
    /// Receives the current play time in milliseconds
    pub on_current_play_time: Arc<dyn Fn(u64) + Send + Sync>,
    /// Receives the native error token, e.g. `PLAYER_ERROR_CONNECTION_FAILED`
    pub on_error: Arc<dyn Fn(&str) + Send + Sync>,
}

#[cfg_attr(test, mockall::automock)]
pub trait AvPlayApi: Send + Sync {
    fn set_listener(&self, listener: AvPlayListener);

    fn clear_listener(&self);

    fn state(&self) -> AvPlayState;

    /// Play time in milliseconds
    fn current_time_ms(&self) -> u64;
}
