// src/infrastructure/logging.rs
//
// Leveled diagnostics on top of the `log` facade.
//
// The monitor logs through `log` macros with target "vidmon". Hosts either
// install their own backend or call `init()` for the console logger below.
// The level is process-wide, like the `log` max level it drives.

use std::fmt;

use log::{LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};

use crate::error::{VidmonError, VidmonResult};

pub const LOG_TARGET: &str = "vidmon";
const TAG: &str = "Vidmon:";

/// Monitor verbosity, from 0 (disabled) to 5 (verbose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogLevel {
    Disabled = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    Verbose = 5,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Disabled => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Verbose => LevelFilter::Trace,
        }
    }

    pub fn from_level_filter(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::Off => LogLevel::Disabled,
            LevelFilter::Error => LogLevel::Error,
            LevelFilter::Warn => LogLevel::Warning,
            LevelFilter::Info => LogLevel::Info,
            LevelFilter::Debug => LogLevel::Debug,
            LevelFilter::Trace => LogLevel::Verbose,
        }
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = VidmonError;

    fn try_from(value: u8) -> Result<Self, VidmonError> {
        match value {
            0 => Ok(LogLevel::Disabled),
            1 => Ok(LogLevel::Error),
            2 => Ok(LogLevel::Warning),
            3 => Ok(LogLevel::Info),
            4 => Ok(LogLevel::Debug),
            5 => Ok(LogLevel::Verbose),
            other => Err(VidmonError::InvalidLogLevel(other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Disabled => "DISABLED",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
        };
        f.write_str(name)
    }
}

pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}

/// Numeric form used by existing integrations; out-of-range values fail.
pub fn set_log_level_raw(level: u8) -> VidmonResult<()> {
    set_log_level(LogLevel::try_from(level)?);
    Ok(())
}

pub fn log_level() -> LogLevel {
    LogLevel::from_level_filter(log::max_level())
}

/// Writes `Vidmon: LEVEL: message` lines to stderr.
pub struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl ConsoleLogger {
    fn level_tag(level: log::Level) -> &'static str {
        match level {
            log::Level::Error => "ERROR:",
            log::Level::Warn => "WARNING:",
            log::Level::Info => "INFO:",
            log::Level::Debug => "DEBUG:",
            log::Level::Trace => "VERBOSE:",
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{} {} {}", TAG, Self::level_tag(record.level()), record.args());
    }

    fn flush(&self) {}
}

/// Install the console logger at the default level (ERROR).
pub fn init() -> VidmonResult<()> {
    log::set_logger(&CONSOLE_LOGGER)
        .map_err(|e| VidmonError::Runtime(format!("Logger already installed: {}", e)))?;
    set_log_level(LogLevel::Error);
    Ok(())
}
