// src/events/bus/signal_bus.rs
//
// Signal bus - typed output for QoE signals.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers execute immediately in subscription order
// 2. Observable - every emission is recorded in the emission log
// 3. Isolated - a panicking handler does not stop the others
// 4. No payload - consumers that need context read the monitor's event log

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::QoeSignal;
use crate::infrastructure::logging::LOG_TARGET;

type SignalHandler = Arc<dyn Fn(QoeSignal) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    by_signal: HashMap<QoeSignal, Vec<SignalHandler>>,
    any: Vec<SignalHandler>,
}

/// A recorded emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalLogEntry {
    pub signal_id: Uuid,
    pub signal: QoeSignal,
    /// Monitor clock time in milliseconds
    pub emitted_at: u64,
    pub handler_count: usize,
}

/// Fan-out point for QoE signals.
///
/// Cloning shares the subscribers and the emission log.
#[derive(Clone, Default)]
pub struct SignalBus {
    subscribers: Arc<RwLock<Subscribers>>,
    emission_log: Arc<RwLock<Vec<SignalLogEntry>>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one signal kind
    ///
    /// ```ignore
    /// bus.subscribe(QoeSignal::VisualStall, |_| report_stall());
    /// ```
    pub fn subscribe<F>(&self, signal: QoeSignal, handler: F)
    where
        F: Fn(QoeSignal) + Send + Sync + 'static,
    {
        self.write_subscribers()
            .by_signal
            .entry(signal)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Subscribe to every signal kind. Runs after the per-kind handlers.
    pub fn subscribe_all<F>(&self, handler: F)
    where
        F: Fn(QoeSignal) + Send + Sync + 'static,
    {
        self.write_subscribers().any.push(Arc::new(handler));
    }

    /// Channel subscription for async consumers.
    ///
    /// A dropped receiver is tolerated; its sends are discarded.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<QoeSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe_all(move |signal| {
            let _ = tx.send(signal);
        });
        rx
    }

    /// Emit a signal
    ///
    /// This will:
    /// 1. Record the emission
    /// 2. Execute the handlers for this signal, then the catch-all handlers
    ///
    /// Handlers run on a snapshot, so a handler may subscribe without
    /// deadlocking; new subscribers see the next emission.
    pub fn emit(&self, signal: QoeSignal, emitted_at: u64) {
        let handlers: Vec<SignalHandler> = {
            let subscribers = self.read_subscribers();
            subscribers
                .by_signal
                .get(&signal)
                .into_iter()
                .flatten()
                .chain(subscribers.any.iter())
                .cloned()
                .collect()
        };

        let entry = SignalLogEntry {
            signal_id: Uuid::new_v4(),
            signal,
            emitted_at,
            handler_count: handlers.len(),
        };
        self.emission_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);

        log::debug!(
            target: LOG_TARGET,
            "[SIGNAL] {} at {}ms | {} handlers",
            signal,
            emitted_at,
            handlers.len()
        );

        for (idx, handler) in handlers.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(signal);
            }));

            if let Err(e) = result {
                log::error!(
                    target: LOG_TARGET,
                    "Handler {} for {} panicked: {:?}",
                    idx,
                    signal,
                    e
                );
            }
        }
    }

    pub fn emission_log(&self) -> Vec<SignalLogEntry> {
        self.emission_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `signal` has been emitted
    pub fn emitted_count(&self, signal: QoeSignal) -> usize {
        self.emission_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.signal == signal)
            .count()
    }

    /// Handlers that will run for `signal`, catch-all ones included
    pub fn subscriber_count(&self, signal: QoeSignal) -> usize {
        let subscribers = self.read_subscribers();
        subscribers.by_signal.get(&signal).map_or(0, Vec::len) + subscribers.any.len()
    }

    /// Remove every subscriber; the emission log is kept
    pub fn clear_subscribers(&self) {
        let mut subscribers = self.write_subscribers();
        subscribers.by_signal.clear();
        subscribers.any.clear();
    }

    fn read_subscribers(&self) -> RwLockReadGuard<'_, Subscribers> {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_subscribers(&self) -> RwLockWriteGuard<'_, Subscribers> {
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
