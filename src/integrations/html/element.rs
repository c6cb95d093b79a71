// src/integrations/html/element.rs
//
// Push-based adapter for event-capable media elements (HTML5 video and
// anything exposing the same listener API).
//
// CRITICAL RULES:
// - Subscribes to exactly MEDIA_EVENTS, nothing else
// - detach removes exactly the listeners attach added
// - Listeners hold the element weakly; the element owns them

use std::sync::{Arc, Mutex, Weak};

use crate::domain::{EventKind, PlayerEvent};
use crate::error::VidmonResult;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::logging::LOG_TARGET;
use crate::integrations::adapter::{lock, AdapterKind, EventHandler, HandlerSlot, PlayerAdapter};
use crate::integrations::html::events::MEDIA_EVENTS;

/// Native listener; receives the native event name
pub type NativeListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Registration id returned by `add_event_listener`
pub type ListenerId = u64;

/// DOM-style media element
#[cfg_attr(test, mockall::automock)]
pub trait MediaElement: Send + Sync {
    fn add_event_listener(&self, event_name: &str, listener: NativeListener) -> ListenerId;

    fn remove_event_listener(&self, event_name: &str, listener_id: ListenerId);

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Current media error token, if the element is in an error state
    fn error(&self) -> Option<String>;
}

#[derive(Default)]
struct ElementState {
    handler: HandlerSlot,
    listeners: Mutex<Vec<(&'static str, ListenerId)>>,
    last_error: Mutex<Option<String>>,
}

pub struct ElementAdapter {
    element: Arc<dyn MediaElement>,
    clock: Arc<dyn Clock>,
    state: Arc<ElementState>,
}

impl ElementAdapter {
    pub fn new(element: Arc<dyn MediaElement>, clock: Arc<dyn Clock>) -> Self {
        log::debug!(target: LOG_TARGET, "Adapter initialized: {}", AdapterKind::HtmlPlayer);
        Self {
            element,
            clock,
            state: Arc::new(ElementState::default()),
        }
    }

    pub fn is_attached(&self) -> bool {
        !lock(&self.state.listeners).is_empty()
    }

    fn build_listener(&self) -> NativeListener {
        let element: Weak<dyn MediaElement> = Arc::downgrade(&self.element);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);

        Arc::new(move |event_name: &str| {
            let Some(element) = element.upgrade() else {
                return;
            };
            let event = adapt_event(element.as_ref(), clock.as_ref(), &state, event_name);
            state.handler.deliver(event);
        })
    }
}

/// Canonical shape of a native event, stamped at capture time.
fn adapt_event(
    element: &dyn MediaElement,
    clock: &dyn Clock,
    state: &ElementState,
    event_name: &str,
) -> PlayerEvent {
    let mut event = PlayerEvent::new(
        EventKind::from_name(event_name),
        clock.now_ms(),
        element.current_time(),
    );

    if event.kind == EventKind::Error {
        let token = element.error();
        if token.is_some() {
            *lock(&state.last_error) = token.clone();
        }
        event.error_message = token;
    }
    event
}

impl PlayerAdapter for ElementAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::HtmlPlayer
    }

    fn set_event_handler(&self, handler: EventHandler) {
        self.state.handler.set(handler);
    }

    fn attach_listeners(&self) -> VidmonResult<()> {
        log::debug!(target: LOG_TARGET, "{} Attaching Listeners {:?}", self.kind(), MEDIA_EVENTS);
        self.state.handler.require()?;

        // Re-attaching must not double-subscribe
        self.detach_listeners();

        let listener = self.build_listener();
        let mut registered = Vec::with_capacity(MEDIA_EVENTS.len());
        for event_name in MEDIA_EVENTS {
            log::trace!(target: LOG_TARGET, "Adding Event Listener {}", event_name);
            let id = self
                .element
                .add_event_listener(event_name, Arc::clone(&listener));
            registered.push((event_name, id));
        }

        *lock(&self.state.listeners) = registered;
        Ok(())
    }

    fn detach_listeners(&self) {
        let registered = std::mem::take(&mut *lock(&self.state.listeners));
        for (event_name, id) in registered {
            log::trace!(target: LOG_TARGET, "Removing Event Listener {}", event_name);
            self.element.remove_event_listener(event_name, id);
        }
    }

    fn get_error(&self) -> Option<String> {
        self.element
            .error()
            .or_else(|| lock(&self.state.last_error).clone())
    }
}
