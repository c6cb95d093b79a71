// src/services/monitor.rs
//
// Monitor Engine - turns canonical player events into QoE signals
//
// CRITICAL RULES:
// - Lifecycle is Idle -> Running -> Stopped (a stopped monitor may start again)
// - Events are processed one at a time, in delivery order, only while Running
// - Every processed event is appended to the event log before heuristics run
// - Watcher timers and events share one lock; heuristics never interleave
// - Signals are emitted after the lock is released
// - stop() cancels every watcher; no signal fires for a stopped session
// - A firing re-checks its session right before emitting; a stop() on another
//   thread between that check and the emit can still let one signal through
// - Construction rejects a zero threshold
//
// Heuristics:
// - play       -> (re)start JoinTime                      => long-join-time
// - timeupdate -> cancel JoinTime, RealStall, PlayAfterWaiting; start RealStall
//                                                          => visual-stall
// - pause      -> cancel JoinTime, RealStall
// - waiting    -> cancel MultiWaiting, PlayAfterWaiting;
//                 start PlayAfterWaiting                   => long-waiting-time
//                 start MultiWaiting (500ms), which records an occurrence
//                 and checks the window                    => multi-waiting-in-row

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{EventKind, MonitorConfig, MonitorOptions, PlayerEvent, QoeSignal, WatcherKind};
use crate::error::{VidmonError, VidmonResult};
use crate::events::{EventLog, EventLogEntry, SignalBus};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::logging::{self, LOG_TARGET};
use crate::integrations::html::MediaElement;
use crate::integrations::{AdapterKind, ElementAdapter, PlayerAdapter};
use crate::services::watchers::{WaitingWindow, WatcherTable};

/// Debounce before a waiting episode counts as an occurrence
pub const MULTI_WAITING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    Idle,
    Running,
    Stopped,
}

/// One start..stop span of monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    /// Monitor clock time of start(), in milliseconds
    pub started_at_ms: u64,
    pub started_at: DateTime<Utc>,
}

/// Dispatch point for native playback errors.
///
/// The monitor is purely observational; the default policy does nothing.
pub trait ErrorPolicy: Send + Sync {
    fn on_player_error(&self, error: Option<&str>);
}

#[derive(Debug, Default)]
pub struct InertErrorPolicy;

impl ErrorPolicy for InertErrorPolicy {
    fn on_player_error(&self, _error: Option<&str>) {}
}

struct MonitorInner {
    adapter: Option<Arc<dyn PlayerAdapter>>,
    error_policy: Arc<dyn ErrorPolicy>,
    state: MonitorState,
    session: Option<SessionInfo>,
    event_log: EventLog,
    last_event: Option<PlayerEvent>,
    watchers: WatcherTable,
    waitings: WaitingWindow,
}

struct MonitorShared {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    signals: SignalBus,
    inner: Mutex<MonitorInner>,
}

pub struct Monitor {
    shared: Arc<MonitorShared>,
}

impl Monitor {
    /// Monitor without a player; bind one with `bind_adapter` before `start`.
    ///
    /// Fails with `InvalidThreshold` when any threshold is zero.
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>) -> VidmonResult<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(MonitorShared {
                config,
                clock,
                signals: SignalBus::new(),
                inner: Mutex::new(MonitorInner {
                    adapter: None,
                    error_policy: Arc::new(InertErrorPolicy),
                    state: MonitorState::Idle,
                    session: None,
                    event_log: EventLog::new(),
                    last_event: None,
                    watchers: WatcherTable::default(),
                    waitings: WaitingWindow::default(),
                }),
            }),
        })
    }

    pub fn with_adapter(
        adapter: Arc<dyn PlayerAdapter>,
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
    ) -> VidmonResult<Self> {
        let monitor = Self::new(config, clock)?;
        monitor.bind_adapter(adapter)?;
        Ok(monitor)
    }

    /// Merge `options` over the defaults, then bind `adapter`.
    pub fn from_options(
        adapter: Arc<dyn PlayerAdapter>,
        options: &MonitorOptions,
        clock: Arc<dyn Clock>,
    ) -> VidmonResult<Self> {
        Self::with_adapter(adapter, MonitorConfig::from_options(options)?, clock)
    }

    /// Direct binding to a media element, wrapped in an `ElementAdapter`.
    pub fn with_element(
        element: Arc<dyn MediaElement>,
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
    ) -> VidmonResult<Self> {
        let adapter = Arc::new(ElementAdapter::new(element, Arc::clone(&clock)));
        Self::with_adapter(adapter, config, clock)
    }

    /// Bind the player adapter and register the monitor as its event handler.
    pub fn bind_adapter(&self, adapter: Arc<dyn PlayerAdapter>) -> VidmonResult<()> {
        let mut inner = self.shared.lock();
        if inner.state == MonitorState::Running {
            return Err(VidmonError::AlreadyRunning);
        }

        let weak = Arc::downgrade(&self.shared);
        adapter.set_event_handler(Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                MonitorShared::handle_event(&shared, event);
            }
        }));

        log::debug!(target: LOG_TARGET, "Adapter bound: {}", adapter.kind());
        inner.adapter = Some(adapter);
        Ok(())
    }

    pub fn set_error_policy(&self, policy: Arc<dyn ErrorPolicy>) {
        self.shared.lock().error_policy = policy;
    }

    /// Start monitoring.
    ///
    /// Fails when no adapter is bound, when already running, or when the
    /// adapter refuses to attach (the state is then rolled back).
    pub fn start(&self) -> VidmonResult<()> {
        let (adapter, previous) = {
            let mut inner = self.shared.lock();
            let adapter = inner.adapter.clone().ok_or(VidmonError::PlayerNotSet)?;
            if inner.state == MonitorState::Running {
                return Err(VidmonError::AlreadyRunning);
            }

            let now = self.shared.clock.now_ms();
            let session = SessionInfo {
                session_id: Uuid::new_v4(),
                started_at_ms: now,
                started_at: Utc::now(),
            };
            inner.event_log.record_start(session.session_id, now);
            inner.session = Some(session);

            let previous = inner.state;
            inner.state = MonitorState::Running;
            (adapter, previous)
        };

        log::debug!(target: LOG_TARGET, "Started with adapter {}", adapter.kind());

        if let Err(err) = adapter.attach_listeners() {
            log::error!(target: LOG_TARGET, "Attaching listeners failed: {}", err);
            self.shared.lock().state = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Stop monitoring. Idempotent.
    ///
    /// The event log is kept; the waiting window starts empty on the next
    /// start.
    pub fn stop(&self) {
        let adapter = {
            let mut inner = self.shared.lock();
            if inner.state != MonitorState::Running {
                return;
            }
            inner.state = MonitorState::Stopped;
            inner.watchers.stop_all();
            inner.waitings.clear();
            inner.adapter.clone()
        };

        log::info!(target: LOG_TARGET, "Stopped");
        if let Some(adapter) = adapter {
            adapter.detach_listeners();
        }
    }

    /// Process one canonical event; ignored unless running.
    ///
    /// Adapters call this through the registered handler.
    pub fn handle_event(&self, event: PlayerEvent) {
        MonitorShared::handle_event(&self.shared, event);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn state(&self) -> MonitorState {
        self.shared.lock().state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn signals(&self) -> &SignalBus {
        &self.shared.signals
    }

    /// Shorthand for `signals().subscribe`
    pub fn on<F>(&self, signal: QoeSignal, handler: F)
    where
        F: Fn(QoeSignal) + Send + Sync + 'static,
    {
        self.shared.signals.subscribe(signal, handler);
    }

    /// Snapshot of the event log
    pub fn event_log(&self) -> Vec<EventLogEntry> {
        self.shared.lock().event_log.entries().to_vec()
    }

    pub fn event_log_json(&self) -> VidmonResult<String> {
        Ok(self.shared.lock().event_log.to_json()?)
    }

    pub fn last_event(&self) -> Option<PlayerEvent> {
        self.shared.lock().last_event.clone()
    }

    pub fn session(&self) -> Option<SessionInfo> {
        self.shared.lock().session.clone()
    }

    pub fn adapter_kind(&self) -> Option<AdapterKind> {
        self.shared.lock().adapter.as_ref().map(|adapter| adapter.kind())
    }

    pub fn live_watchers(&self) -> Vec<WatcherKind> {
        self.shared.lock().watchers.live_kinds()
    }

    pub fn is_watching(&self, kind: WatcherKind) -> bool {
        self.shared.lock().watchers.is_live(kind)
    }

    /// Clock time at which the live watcher of `kind` fires
    pub fn watcher_deadline(&self, kind: WatcherKind) -> Option<u64> {
        self.shared.lock().watchers.deadline(kind)
    }

    pub fn waiting_occurrences(&self) -> usize {
        self.shared.lock().waitings.len()
    }

    /// Process-wide log level, 0 (disabled) to 5 (verbose)
    pub fn set_log_level(&self, level: u8) -> VidmonResult<()> {
        logging::set_log_level_raw(level)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MonitorShared {
    fn lock(&self) -> MutexGuard<'_, MonitorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_event(shared: &Arc<Self>, event: PlayerEvent) {
        let mut inner = shared.lock();
        if inner.state != MonitorState::Running {
            log::trace!(target: LOG_TARGET, "Ignoring {} while {:?}", event.kind, inner.state);
            return;
        }

        let player_error = match event.kind {
            EventKind::Error => inner
                .adapter
                .as_ref()
                .and_then(|adapter| adapter.get_error())
                .or_else(|| event.error_message.clone()),
            _ => None,
        };
        log_event(&event, player_error.as_deref());

        let session_id = inner
            .session
            .as_ref()
            .map_or(Uuid::nil(), |session| session.session_id);
        let now = shared.clock.now_ms();
        inner.event_log.record_event(session_id, now, event.clone());
        inner.last_event = Some(event.clone());

        if let Err(err) = Self::update_watchers(shared, &mut inner, &event.kind) {
            log::error!(target: LOG_TARGET, "Watcher update for {} failed: {}", event.kind, err);
        }

        let policy = Arc::clone(&inner.error_policy);
        drop(inner);

        if event.kind == EventKind::Error {
            policy.on_player_error(player_error.as_deref());
        }
    }

    fn update_watchers(
        shared: &Arc<Self>,
        inner: &mut MonitorInner,
        kind: &EventKind,
    ) -> VidmonResult<()> {
        let config = &shared.config;

        match kind {
            EventKind::Play => {
                Self::start_watcher(shared, inner, WatcherKind::JoinTime, config.jointime_threshold, true)?;
            }
            EventKind::TimeUpdate => {
                inner.watchers.stop(WatcherKind::JoinTime);
                inner.watchers.stop(WatcherKind::RealStall);
                inner.watchers.stop(WatcherKind::PlayAfterWaiting);
                Self::start_watcher(
                    shared,
                    inner,
                    WatcherKind::RealStall,
                    config.timeupdate_threshold,
                    false,
                )?;
            }
            EventKind::Pause => {
                inner.watchers.stop(WatcherKind::JoinTime);
                inner.watchers.stop(WatcherKind::RealStall);
            }
            EventKind::Waiting => {
                inner.watchers.stop(WatcherKind::MultiWaiting);
                inner.watchers.stop(WatcherKind::PlayAfterWaiting);
                Self::start_watcher(
                    shared,
                    inner,
                    WatcherKind::PlayAfterWaiting,
                    config.play_after_waiting_threshold,
                    false,
                )?;
                Self::start_watcher(
                    shared,
                    inner,
                    WatcherKind::MultiWaiting,
                    MULTI_WAITING_DELAY,
                    false,
                )?;
            }
            _ => {}
        }
        Ok(())
    }

    fn start_watcher(
        shared: &Arc<Self>,
        inner: &mut MonitorInner,
        kind: WatcherKind,
        delay: Duration,
        overwrite: bool,
    ) -> VidmonResult<()> {
        let clock = &shared.clock;
        let deadline = clock.now_ms().saturating_add(delay.as_millis() as u64);
        let weak = Arc::downgrade(shared);

        inner.watchers.start(kind, deadline, overwrite, |generation| {
            clock.after(
                delay,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        MonitorShared::on_watcher_fired(&shared, kind, generation);
                    }
                }),
            )
        })
    }

    fn on_watcher_fired(shared: &Arc<Self>, kind: WatcherKind, generation: u64) {
        let (signal, session_id) = {
            let mut inner = shared.lock();
            if inner.state != MonitorState::Running {
                return;
            }
            if !inner.watchers.complete(kind, generation) {
                log::trace!(target: LOG_TARGET, "Stale watcher for {} ignored", kind);
                return;
            }
            let session_id = inner.session.as_ref().map(|session| session.session_id);
            (Self::evaluate(shared, &mut inner, kind), session_id)
        };

        let Some(signal) = signal else {
            return;
        };
        if !shared.is_running_session(session_id) {
            log::debug!(target: LOG_TARGET, "Dropping {} raised before stop", signal);
            return;
        }
        shared.signals.emit(signal, shared.clock.now_ms());
    }

    fn is_running_session(&self, session_id: Option<Uuid>) -> bool {
        let inner = self.lock();
        inner.state == MonitorState::Running
            && inner.session.as_ref().map(|session| session.session_id) == session_id
    }

    fn evaluate(shared: &Arc<Self>, inner: &mut MonitorInner, kind: WatcherKind) -> Option<QoeSignal> {
        let config = &shared.config;

        match kind {
            WatcherKind::JoinTime => {
                log::warn!(
                    target: LOG_TARGET,
                    "Join time took more than {} seconds",
                    config.jointime_threshold.as_secs_f64()
                );
                Some(QoeSignal::LongJoinTime)
            }
            WatcherKind::RealStall => {
                log::warn!(
                    target: LOG_TARGET,
                    "The player visually stalled for more than {} seconds",
                    config.timeupdate_threshold.as_secs_f64()
                );
                Some(QoeSignal::VisualStall)
            }
            WatcherKind::PlayAfterWaiting => {
                log::warn!(
                    target: LOG_TARGET,
                    "The player still waiting for more than {} seconds",
                    config.play_after_waiting_threshold.as_secs_f64()
                );
                Some(QoeSignal::LongWaitingTime)
            }
            WatcherKind::MultiWaiting => {
                let window_ms = config.waiting_ts_diff_threshold.as_millis() as u64;
                match inner.waitings.record(shared.clock.now_ms()) {
                    Some(span) if span <= window_ms => {
                        log::warn!(
                            target: LOG_TARGET,
                            "The player waited more than 3 times in less than {} seconds",
                            config.waiting_ts_diff_threshold.as_secs_f64()
                        );
                        Some(QoeSignal::MultiWaitingInRow)
                    }
                    _ => None,
                }
            }
        }
    }
}

fn log_event(event: &PlayerEvent, player_error: Option<&str>) {
    match event.kind {
        EventKind::Play | EventKind::Pause | EventKind::RateChange | EventKind::Seeked => {
            log::info!(target: LOG_TARGET, "Got event {}", event.kind);
        }
        EventKind::Error => {
            log::error!(target: LOG_TARGET, "Got Error {}", player_error.unwrap_or("unknown"));
        }
        _ => {
            log::trace!(target: LOG_TARGET, "Got event {}", event.kind);
        }
    }
}
