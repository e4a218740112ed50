//! Log events emitted by an import run.
//!
//! The import core never logs through global state; it reports what happened to a
//! [`LogSink`] handed in by the caller. The binary forwards events to `tracing`,
//! tests collect them into a `Vec<LogEvent>`.

use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
}

/// Receiver for log events. Fire-and-forget.
pub trait LogSink {
    fn emit(&mut self, level: LogLevel, message: String);

    fn info(&mut self, message: String) {
        self.emit(LogLevel::Info, message);
    }

    fn warning(&mut self, message: String) {
        self.emit(LogLevel::Warning, message);
    }

    fn error(&mut self, message: String) {
        self.emit(LogLevel::Error, message);
    }
}

impl LogSink for Vec<LogEvent> {
    fn emit(&mut self, level: LogLevel, message: String) {
        self.push(LogEvent { level, message });
    }
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warning => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
    }
}
