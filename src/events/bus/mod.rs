// src/events/bus/mod.rs

pub mod signal_bus;

pub use signal_bus::{SignalBus, SignalLogEntry};
