// src/error/types.rs
use serde::Serialize;
use thiserror::Error;

use crate::domain::WatcherKind;

#[derive(Debug, Error)]
pub enum VidmonError {
    #[error("Video player is not set yet")]
    PlayerNotSet,

    #[error("Event handler is not initialized")]
    MissingEventHandler,

    #[error("Event type {0} has watcher already!")]
    WatcherAlreadyRunning(WatcherKind),

    #[error("Log level should be between 0 (disabled) and 5 (verbose), got {0}")]
    InvalidLogLevel(u8),

    #[error("Threshold {name} must be greater than zero")]
    InvalidThreshold { name: &'static str },

    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl VidmonError {
    /// True for programmer-misuse failures that are meant to fail fast at
    /// integration time.
    pub fn is_validation(&self) -> bool {
        !matches!(self, VidmonError::Serialization(_) | VidmonError::Runtime(_))
    }
}

impl Serialize for VidmonError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<tokio::runtime::TryCurrentError> for VidmonError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        VidmonError::Runtime(format!("No tokio runtime: {}", err))
    }
}

pub type VidmonResult<T> = Result<T, VidmonError>;
