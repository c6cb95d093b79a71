// src/integrations/avplay/adapter.rs
//
// Poll-based adapter for AV playback APIs without play/pause callbacks.
//
// CRITICAL RULES:
// - buffering-start -> waiting, current-play-time -> timeupdate,
//   error -> error (token kept for get_error)
// - play/pause are synthesized by a state-diff poll on the clock
// - A poll emits only when the observed state changed
// - detach cancels the poll and clears the native listener
//
// The poll re-arms itself through Clock::after, so it runs on the same clock
// as the monitor and stays deterministic under a ManualClock.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::domain::{EventKind, PlayerEvent};
use crate::error::{VidmonError, VidmonResult};
use crate::infrastructure::clock::{Clock, TimerHandle};
use crate::infrastructure::logging::LOG_TARGET;
use crate::integrations::adapter::{lock, AdapterKind, EventHandler, HandlerSlot, PlayerAdapter};
use crate::integrations::avplay::api::{AvPlayApi, AvPlayListener, AvPlayState};

pub const DEFAULT_STATE_POLL_INTERVAL: Duration = Duration::from_millis(500);

struct PollState {
    active: bool,
    /// Bumped on every attach/detach; stale poll timers compare against it
    generation: u64,
    last_state: AvPlayState,
    timer: Option<TimerHandle>,
}

struct AvPlayShared {
    api: Weak<dyn AvPlayApi>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    handler: HandlerSlot,
    last_error: Mutex<Option<String>>,
    poll: Mutex<PollState>,
}

impl AvPlayShared {
    fn is_active(&self) -> bool {
        lock(&self.poll).active
    }

    fn forward(&self, kind: EventKind, error_message: Option<String>) {
        if !self.is_active() {
            return;
        }

        let current_time = self
            .api
            .upgrade()
            .map_or(0.0, |api| api.current_time_ms() as f64 / 1000.0);
        let mut event = PlayerEvent::new(kind, self.clock.now_ms(), current_time);
        event.error_message = error_message;

        self.handler.deliver(event);
    }

    fn schedule_poll(shared: &Arc<Self>, generation: u64) {
        let weak = Arc::downgrade(shared);
        let handle = shared.clock.after(
            shared.poll_interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    AvPlayShared::poll_state(&shared, generation);
                }
            }),
        );

        let mut poll = lock(&shared.poll);
        if poll.active && poll.generation == generation {
            poll.timer = Some(handle);
        } else {
            handle.cancel();
        }
    }

    fn poll_state(shared: &Arc<Self>, generation: u64) {
        let Some(api) = shared.api.upgrade() else {
            return;
        };
        let state = api.state();

        let transition = {
            let mut poll = lock(&shared.poll);
            if !poll.active || poll.generation != generation {
                return;
            }
            if state == poll.last_state {
                None
            } else {
                log::trace!(target: LOG_TARGET, "AV state {:?} -> {:?}", poll.last_state, state);
                poll.last_state = state;
                match state {
                    AvPlayState::Playing => Some(EventKind::Play),
                    AvPlayState::Paused => Some(EventKind::Pause),
                    _ => None,
                }
            }
        };

        if let Some(kind) = transition {
            shared.forward(kind, None);
        }
        Self::schedule_poll(shared, generation);
    }
}

pub struct AvPlayAdapter {
    api: Arc<dyn AvPlayApi>,
    shared: Arc<AvPlayShared>,
}

impl AvPlayAdapter {
    pub fn new(api: Arc<dyn AvPlayApi>, clock: Arc<dyn Clock>) -> Self {
        Self::build(api, clock, DEFAULT_STATE_POLL_INTERVAL)
    }

    /// Custom state poll period; must be non-zero.
    pub fn with_poll_interval(
        api: Arc<dyn AvPlayApi>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> VidmonResult<Self> {
        if poll_interval.is_zero() {
            return Err(VidmonError::Validation(
                "State poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self::build(api, clock, poll_interval))
    }

    fn build(api: Arc<dyn AvPlayApi>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        log::debug!(target: LOG_TARGET, "Adapter initialized: {}", AdapterKind::AvPlayer);
        let shared = Arc::new(AvPlayShared {
            api: Arc::downgrade(&api),
            clock,
            poll_interval,
            handler: HandlerSlot::default(),
            last_error: Mutex::new(None),
            poll: Mutex::new(PollState {
                active: false,
                generation: 0,
                last_state: AvPlayState::Idle,
                timer: None,
            }),
        });

        Self { api, shared }
    }

    pub fn is_attached(&self) -> bool {
        self.shared.is_active()
    }

    fn build_listener(&self) -> AvPlayListener {
        let buffering = Arc::clone(&self.shared);
        let play_time = Arc::clone(&self.shared);
        let errors = Arc::clone(&self.shared);

        AvPlayListener {
            on_buffering_start: Arc::new(move || buffering.forward(EventKind::Waiting, None)),
            on_current_play_time: Arc::new(move |_current_ms: u64| {
                play_time.forward(EventKind::TimeUpdate, None)
            }),
            on_error: Arc::new(move |token: &str| {
                *lock(&errors.last_error) = Some(token.to_string());
                errors.forward(EventKind::Error, Some(token.to_string()));
            }),
        }
    }
}

impl PlayerAdapter for AvPlayAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::AvPlayer
    }

    fn set_event_handler(&self, handler: EventHandler) {
        self.shared.handler.set(handler);
    }

    fn attach_listeners(&self) -> VidmonResult<()> {
        log::debug!(target: LOG_TARGET, "{} Attaching Listeners", self.kind());
        self.shared.handler.require()?;

        self.detach_listeners();
        self.api.set_listener(self.build_listener());

        let generation = {
            let mut poll = lock(&self.shared.poll);
            poll.active = true;
            poll.generation += 1;
            poll.last_state = AvPlayState::Idle;
            poll.generation
        };
        AvPlayShared::schedule_poll(&self.shared, generation);
        Ok(())
    }

    fn detach_listeners(&self) {
        let (was_active, timer) = {
            let mut poll = lock(&self.shared.poll);
            let was_active = poll.active;
            poll.active = false;
            poll.generation += 1;
            (was_active, poll.timer.take())
        };

        if let Some(timer) = timer {
            timer.cancel();
        }
        if was_active {
            log::debug!(target: LOG_TARGET, "{} Detaching Listeners", self.kind());
            self.api.clear_listener();
        }
    }

    fn get_error(&self) -> Option<String> {
        lock(&self.shared.last_error).clone()
    }
}
