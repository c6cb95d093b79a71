// src/services/watchers.rs
//
// Watcher table and waiting-occurrences window.
//
// CRITICAL RULES:
// - At most one live watcher per kind
// - Starting a live kind fails unless overwrite is requested
// - A timer whose generation no longer matches the live watcher is stale
//   and must be ignored when it fires

use std::collections::{HashMap, VecDeque};

use crate::domain::WatcherKind;
use crate::error::{VidmonError, VidmonResult};
use crate::infrastructure::clock::TimerHandle;
use crate::infrastructure::logging::LOG_TARGET;

/// Occurrences kept for the repeated-buffering check
pub const WAITING_WINDOW_CAPACITY: usize = 4;

#[derive(Debug)]
struct Watcher {
    generation: u64,
    deadline: u64,
    timer: TimerHandle,
}

#[derive(Debug, Default)]
pub(crate) struct WatcherTable {
    live: HashMap<WatcherKind, Watcher>,
    next_generation: u64,
}

impl WatcherTable {
    /// Install a watcher for `kind`.
    ///
    /// `arm` receives the new generation and must schedule the timer.
    pub(crate) fn start<F>(
        &mut self,
        kind: WatcherKind,
        deadline: u64,
        overwrite: bool,
        arm: F,
    ) -> VidmonResult<()>
    where
        F: FnOnce(u64) -> TimerHandle,
    {
        log::trace!(target: LOG_TARGET, "Adding watcher for {}", kind);

        if self.live.contains_key(&kind) {
            if !overwrite {
                return Err(VidmonError::WatcherAlreadyRunning(kind));
            }
            self.stop(kind);
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let timer = arm(generation);
        self.live.insert(
            kind,
            Watcher {
                generation,
                deadline,
                timer,
            },
        );
        Ok(())
    }

    /// Cancel the live watcher for `kind`; no-op when none is live.
    pub(crate) fn stop(&mut self, kind: WatcherKind) -> bool {
        match self.live.remove(&kind) {
            Some(watcher) => {
                log::trace!(target: LOG_TARGET, "Removing watcher for {}", kind);
                watcher.timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Retire a watcher whose timer just fired.
    ///
    /// Returns false for a stale timer, leaving the table untouched.
    pub(crate) fn complete(&mut self, kind: WatcherKind, generation: u64) -> bool {
        match self.live.get(&kind) {
            Some(watcher) if watcher.generation == generation => {
                self.live.remove(&kind);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn stop_all(&mut self) {
        for (_, watcher) in self.live.drain() {
            watcher.timer.cancel();
        }
    }

    pub(crate) fn is_live(&self, kind: WatcherKind) -> bool {
        self.live.contains_key(&kind)
    }

    pub(crate) fn deadline(&self, kind: WatcherKind) -> Option<u64> {
        self.live.get(&kind).map(|watcher| watcher.deadline)
    }

    pub(crate) fn live_kinds(&self) -> Vec<WatcherKind> {
        let mut kinds: Vec<WatcherKind> = self.live.keys().copied().collect();
        kinds.sort_by_key(|kind| *kind as u8);
        kinds
    }
}

/// Timestamps of recent short-lived waiting episodes
#[derive(Debug, Default)]
pub(crate) struct WaitingWindow {
    occurrences: VecDeque<u64>,
}

impl WaitingWindow {
    /// Record an occurrence, evicting the oldest beyond capacity.
    ///
    /// Once the window is full, returns the span between the oldest and the
    /// newest occurrence.
    pub(crate) fn record(&mut self, ts: u64) -> Option<u64> {
        self.occurrences.push_back(ts);
        while self.occurrences.len() > WAITING_WINDOW_CAPACITY {
            self.occurrences.pop_front();
        }

        if self.occurrences.len() < WAITING_WINDOW_CAPACITY {
            return None;
        }
        let oldest = self.occurrences.front()?;
        let newest = self.occurrences.back()?;
        Some(newest.saturating_sub(*oldest))
    }

    pub(crate) fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub(crate) fn clear(&mut self) {
        self.occurrences.clear();
    }
}
