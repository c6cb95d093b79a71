// src/infrastructure/clock.rs
//
// Clock - time source and one-shot timer scheduling
//
// CRITICAL RULES:
// - Timers never block the caller; waiting is a scheduled callback
// - Every timer is cancelable before it fires
// - A cancelled timer never runs its callback (the ManualClock guarantees it,
//   the TokioClock guarantees it unless the callback already started)
//
// TokioClock drives production timers on the tokio runtime.
// ManualClock is advanced explicitly so heuristics are deterministic in tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::VidmonResult;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancelable handle to a scheduled callback.
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl TimerHandle {
    fn new(cancelled: Arc<AtomicBool>, task: Option<AbortHandle>) -> Self {
        Self { cancelled, task }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Time source plus one-shot scheduler, in milliseconds.
pub trait Clock: Send + Sync {
    /// Milliseconds since the clock's origin.
    fn now_ms(&self) -> u64;

    /// Run `callback` once `delay` has elapsed, unless cancelled first.
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

// ============================================================================
// TOKIO CLOCK
// ============================================================================

pub struct TokioClock {
    origin: Instant,
    runtime: Handle,
}

impl TokioClock {
    /// Bind to the runtime of the calling context.
    pub fn new() -> VidmonResult<Self> {
        Ok(Self::with_handle(Handle::try_current()?))
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            origin: Instant::now(),
            runtime,
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                callback();
            }
        });

        TimerHandle::new(cancelled, Some(task.abort_handle()))
    }
}

// ============================================================================
// MANUAL CLOCK
// ============================================================================

struct PendingTimer {
    cancelled: Arc<AtomicBool>,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    now_ms: u64,
    next_seq: u64,
    /// Keyed by (deadline, scheduling order)
    pending: BTreeMap<(u64, u64), PendingTimer>,
}

/// Simulated clock. Time moves only through `advance`/`advance_to`.
///
/// Due callbacks run in deadline order, ties in scheduling order, one at a
/// time with no internal lock held, so a callback may read the clock or
/// schedule further timers. Timers scheduled during an advance fire in the
/// same advance if they fall due before its target.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now_ms: u64) -> Self {
        let clock = Self::default();
        clock.lock().now_ms = now_ms;
        clock
    }

    pub fn advance(&self, by: Duration) {
        let target = self.now_ms().saturating_add(by.as_millis() as u64);
        self.advance_to(target);
    }

    /// Moves forward to `target_ms`; a target in the past still flushes
    /// timers that are already due.
    pub fn advance_to(&self, target_ms: u64) {
        loop {
            let timer = {
                let mut state = self.lock();
                let key = match state.pending.keys().next().copied() {
                    Some(key) if key.0 <= target_ms => key,
                    _ => {
                        state.now_ms = state.now_ms.max(target_ms);
                        return;
                    }
                };
                state.now_ms = state.now_ms.max(key.0);
                state.pending.remove(&key)
            };

            if let Some(timer) = timer {
                if !timer.cancelled.load(Ordering::SeqCst) {
                    (timer.callback)();
                }
            }
        }
    }

    /// Timers still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.lock()
            .pending
            .values()
            .filter(|timer| !timer.cancelled.load(Ordering::SeqCst))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.lock().now_ms
    }

    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.lock();

        let deadline = state.now_ms.saturating_add(delay.as_millis() as u64);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.insert(
            (deadline, seq),
            PendingTimer {
                cancelled: Arc::clone(&cancelled),
                callback,
            },
        );

        TimerHandle::new(cancelled, None)
    }
}
