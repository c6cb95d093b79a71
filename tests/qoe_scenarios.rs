// tests/qoe_scenarios.rs
//
// End-to-end QoE scenarios: native player -> adapter -> monitor -> signals.
// Every scenario except the last runs on a ManualClock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidmon::{
    AvPlayAdapter, AvPlayApi, AvPlayListener, AvPlayState, EventKind, ManualClock, MediaElement,
    Monitor, MonitorConfig, MonitorState, NativeListener, QoeSignal, TokioClock, MEDIA_EVENTS,
};
use vidmon::integrations::html::ListenerId;

// ============================================================================
// FAKE PLAYERS
// ============================================================================

#[derive(Default)]
struct FakeVideo {
    listeners: Mutex<HashMap<String, Vec<(ListenerId, NativeListener)>>>,
    next_id: Mutex<ListenerId>,
    position: Mutex<f64>,
    error: Mutex<Option<String>>,
}

impl FakeVideo {
    fn fire(&self, event_name: &str) {
        let listeners: Vec<NativeListener> = self
            .listeners
            .lock()
            .unwrap()
            .get(event_name)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(event_name);
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().values().map(Vec::len).sum()
    }
}

impl MediaElement for FakeVideo {
    fn add_event_listener(&self, event_name: &str, listener: NativeListener) -> ListenerId {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.listeners
            .lock()
            .unwrap()
            .entry(event_name.to_string())
            .or_default()
            .push((*next_id, listener));
        *next_id
    }

    fn remove_event_listener(&self, event_name: &str, listener_id: ListenerId) {
        if let Some(entries) = self.listeners.lock().unwrap().get_mut(event_name) {
            entries.retain(|(id, _)| *id != listener_id);
        }
    }

    fn current_time(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct FakeAvPlay {
    state: Mutex<Option<AvPlayState>>,
    listener: Mutex<Option<AvPlayListener>>,
}

impl FakeAvPlay {
    fn set_state(&self, state: AvPlayState) {
        *self.state.lock().unwrap() = Some(state);
    }

    fn listener(&self) -> AvPlayListener {
        self.listener.lock().unwrap().clone().unwrap()
    }
}

impl AvPlayApi for FakeAvPlay {
    fn set_listener(&self, listener: AvPlayListener) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    fn clear_listener(&self) {
        *self.listener.lock().unwrap() = None;
    }

    fn state(&self) -> AvPlayState {
        self.state.lock().unwrap().unwrap_or(AvPlayState::None)
    }

    fn current_time_ms(&self) -> u64 {
        0
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn video_monitor(config: MonitorConfig) -> (Arc<FakeVideo>, ManualClock, Monitor) {
    let video = Arc::new(FakeVideo::default());
    let clock = ManualClock::new();
    let monitor = Monitor::with_element(video.clone(), config, Arc::new(clock.clone())).unwrap();
    monitor.start().unwrap();
    (video, clock, monitor)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn emitted(monitor: &Monitor) -> Vec<QoeSignal> {
    monitor
        .signals()
        .emission_log()
        .into_iter()
        .map(|entry| entry.signal)
        .collect()
}

/// One buffering episode that lasts `stall` before playback resumes
fn waiting_episode(video: &FakeVideo, clock: &ManualClock, stall: Duration) {
    video.fire("waiting");
    clock.advance(stall);
    video.fire("timeupdate");
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn start_attaches_to_every_media_event() {
    let (video, _clock, monitor) = video_monitor(MonitorConfig::default());

    assert_eq!(monitor.state(), MonitorState::Running);
    assert_eq!(video.listener_count(), MEDIA_EVENTS.len());
}

#[test]
fn event_log_records_every_delivery_in_order() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());
    let names = ["loadstart", "loadedmetadata", "play", "playing", "timeupdate", "pause"];

    for name in names {
        clock.advance(Duration::from_millis(250));
        video.fire(name);
    }

    let log = monitor.event_log();
    assert_eq!(log.len(), names.len() + 1);
    assert!(log[0].is_monitor_start());

    let logged: Vec<&str> = log
        .iter()
        .filter_map(|entry| entry.player_event())
        .map(|event| event.kind.as_str())
        .collect();
    assert_eq!(logged, names.to_vec());
    assert!(log.windows(2).all(|pair| pair[0].ts <= pair[1].ts));
}

#[test]
fn unresolved_join_emits_one_long_join_time() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    clock.advance(secs(29));
    assert!(emitted(&monitor).is_empty());

    clock.advance(secs(1));
    clock.advance(secs(120));

    assert_eq!(emitted(&monitor), vec![QoeSignal::LongJoinTime]);
    assert_eq!(monitor.signals().emission_log()[0].emitted_at, 30_000);
}

#[test]
fn progress_resolves_join_then_silence_stalls() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    clock.advance(secs(2));
    video.fire("timeupdate");

    clock.advance(secs(9));
    assert!(emitted(&monitor).is_empty());

    clock.advance(secs(60));
    assert_eq!(emitted(&monitor), vec![QoeSignal::VisualStall]);
    assert_eq!(monitor.signals().emission_log()[0].emitted_at, 12_000);
}

#[test]
fn steady_progress_never_stalls() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    for _ in 0..40 {
        clock.advance(Duration::from_millis(250));
        video.fire("timeupdate");
    }

    assert!(emitted(&monitor).is_empty());
}

#[test]
fn pause_cancels_join_and_stall_watchers() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    clock.advance(secs(1));
    video.fire("timeupdate");
    video.fire("pause");

    assert!(monitor.live_watchers().is_empty());
    clock.advance(secs(300));
    assert!(emitted(&monitor).is_empty());
}

#[test]
fn long_buffering_emits_long_waiting_time() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    clock.advance(secs(1));
    video.fire("timeupdate");
    video.fire("waiting");
    clock.advance(secs(5));

    assert_eq!(emitted(&monitor), vec![QoeSignal::LongWaitingTime]);
}

#[test]
fn four_waitings_inside_window_emit_multi_waiting_in_row() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    for _ in 0..4 {
        waiting_episode(&video, &clock, secs(1));
        clock.advance(secs(4));
    }

    assert_eq!(emitted(&monitor), vec![QoeSignal::MultiWaitingInRow]);
}

#[test]
fn four_waitings_spread_past_window_emit_nothing() {
    let config = MonitorConfig {
        waiting_ts_diff_threshold: secs(10),
        ..MonitorConfig::default()
    };
    let (video, clock, monitor) = video_monitor(config);

    // Occurrences at 0.5s, 5.5s, 10.5s, 15.5s: span 15s
    for _ in 0..4 {
        waiting_episode(&video, &clock, secs(1));
        clock.advance(secs(4));
    }

    assert!(emitted(&monitor).is_empty());
    assert_eq!(monitor.waiting_occurrences(), 4);
}

#[test]
fn waiting_burst_counts_as_one_occurrence() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    for _ in 0..4 {
        video.fire("waiting");
        clock.advance(Duration::from_millis(100));
    }
    clock.advance(secs(1));
    video.fire("timeupdate");

    assert_eq!(monitor.waiting_occurrences(), 1);
    assert!(emitted(&monitor).is_empty());
}

#[test]
fn stop_silences_player_and_pending_watchers() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());

    video.fire("play");
    video.fire("waiting");
    monitor.stop();
    let logged = monitor.event_log().len();

    video.fire("timeupdate");
    video.fire("waiting");
    clock.advance(secs(300));

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(video.listener_count(), 0);
    assert_eq!(monitor.event_log().len(), logged);
    assert!(emitted(&monitor).is_empty());
}

#[test]
fn restart_begins_a_new_session() {
    let (video, clock, monitor) = video_monitor(MonitorConfig::default());
    let first = monitor.session().unwrap().session_id;

    monitor.stop();
    clock.advance(secs(5));
    monitor.start().unwrap();
    video.fire("play");

    let second = monitor.session().unwrap();
    assert_ne!(second.session_id, first);
    assert_eq!(second.started_at_ms, 5_000);
    assert_eq!(video.listener_count(), MEDIA_EVENTS.len());

    let last = monitor.event_log().pop().unwrap();
    assert_eq!(last.session_id, second.session_id);
}

#[test]
fn element_error_is_logged_with_native_token() {
    let (video, _clock, monitor) = video_monitor(MonitorConfig::default());

    *video.error.lock().unwrap() = Some("MEDIA_ERR_SRC_NOT_SUPPORTED".to_string());
    *video.position.lock().unwrap() = 3.25;
    video.fire("error");

    let event = monitor.last_event().unwrap();
    assert_eq!(event.kind, EventKind::Error);
    assert_eq!(event.current_time, 3.25);
    assert_eq!(event.error_message.as_deref(), Some("MEDIA_ERR_SRC_NOT_SUPPORTED"));
    assert!(emitted(&monitor).is_empty());
}

#[test]
fn event_log_serializes_with_wire_field_names() {
    let (video, _clock, monitor) = video_monitor(MonitorConfig::default());
    video.fire("play");

    let json: serde_json::Value = serde_json::from_str(&monitor.event_log_json().unwrap()).unwrap();
    let entries = json.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["event"]["type"], "play");
    assert_eq!(entries[1]["event"]["currentTime"], 0.0);
}

#[test]
fn empty_options_yield_defaults() {
    assert_eq!(MonitorConfig::from_json("{}").unwrap(), MonitorConfig::default());
}

#[test]
fn zero_stall_threshold_fails_construction() {
    let config = MonitorConfig {
        timeupdate_threshold: Duration::ZERO,
        ..MonitorConfig::default()
    };
    let video = Arc::new(FakeVideo::default());

    let built = Monitor::with_element(video.clone(), config, Arc::new(ManualClock::new()));

    assert!(built.is_err());
    assert_eq!(video.listener_count(), 0);
}

#[test]
fn avplay_state_poll_drives_join_and_waiting_heuristics() {
    let api = Arc::new(FakeAvPlay::default());
    let clock = ManualClock::new();
    let adapter = Arc::new(AvPlayAdapter::new(api.clone(), Arc::new(clock.clone())));
    let monitor =
        Monitor::with_adapter(adapter, MonitorConfig::default(), Arc::new(clock.clone())).unwrap();
    monitor.start().unwrap();

    api.set_state(AvPlayState::Playing);
    clock.advance(Duration::from_millis(500));
    assert_eq!(monitor.last_event().unwrap().kind, EventKind::Play);

    (api.listener().on_current_play_time)(1_000);
    (api.listener().on_buffering_start)();
    clock.advance(secs(6));

    assert_eq!(emitted(&monitor), vec![QoeSignal::LongWaitingTime]);

    monitor.stop();
    assert!(api.listener.lock().unwrap().is_none());
}

#[tokio::test]
async fn real_clock_delivers_signals_over_channel() {
    let video = Arc::new(FakeVideo::default());
    let clock = Arc::new(TokioClock::new().unwrap());
    let config = MonitorConfig {
        jointime_threshold: Duration::from_millis(50),
        ..MonitorConfig::default()
    };
    let monitor = Monitor::with_element(video.clone(), config, clock).unwrap();
    let mut signals = monitor.signals().channel();
    monitor.start().unwrap();

    video.fire("play");

    let signal = tokio::time::timeout(Duration::from_secs(2), signals.recv())
        .await
        .unwrap();
    assert_eq!(signal, Some(QoeSignal::LongJoinTime));
}
