// src/integrations/adapter.rs
//
// Player Adapter contract.
//
// CRITICAL RULES:
// - An adapter is the only producer of canonical PlayerEvents
// - ts and currentTime are taken at capture time, not delivery time
// - attach_listeners fails until an event handler is registered
// - detach_listeners is idempotent
// - The handler is never invoked while an adapter lock is held

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::PlayerEvent;
use crate::error::{VidmonError, VidmonResult};

/// Receives canonical events from an adapter
pub type EventHandler = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

/// Player technology behind an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterKind {
    /// Tizen
    AvPlayer,
    /// Web native HTML5
    HtmlPlayer,
    /// iOS
    AvPlay,
    /// Android
    ExoPlayer,
}

impl AdapterKind {
    pub fn description(&self) -> &'static str {
        match self {
            AdapterKind::AvPlayer => "Tizen AV Player",
            AdapterKind::HtmlPlayer => "HTML5 Video Player",
            AdapterKind::AvPlay => "Apple AV Play",
            AdapterKind::ExoPlayer => "Android Exo Player",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Uniform event source over one concrete player.
#[cfg_attr(test, mockall::automock)]
pub trait PlayerAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Register the canonical-event callback, replacing any previous one.
    fn set_event_handler(&self, handler: EventHandler);

    /// Start forwarding native events.
    fn attach_listeners(&self) -> VidmonResult<()>;

    /// Stop forwarding native events and cancel any polling.
    fn detach_listeners(&self);

    /// Last native error token, if any.
    fn get_error(&self) -> Option<String>;
}

/// Handler storage shared by the adapter implementations
#[derive(Default)]
pub(crate) struct HandlerSlot {
    handler: Mutex<Option<EventHandler>>,
}

impl HandlerSlot {
    pub(crate) fn set(&self, handler: EventHandler) {
        *self.lock() = Some(handler);
    }

    pub(crate) fn require(&self) -> VidmonResult<EventHandler> {
        self.lock().clone().ok_or(VidmonError::MissingEventHandler)
    }

    /// Forward an event; dropped if no handler is registered.
    pub(crate) fn deliver(&self, event: PlayerEvent) {
        let handler = self.lock().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<EventHandler>> {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Poison-tolerant lock used across the adapters.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
