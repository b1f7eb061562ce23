//! Run-result accumulation: logs, errors, named outputs, terminal status.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal status of one run.
///
/// `Success` is the initial value and stays until an error or cancellation
/// is recorded; it only becomes meaningful once the run returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Success,
    Failed,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.pad(name)
    }
}

/// One run log line, stamped at capture time.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub step_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One recorded failure.
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub message: String,
    pub step_type: Option<String>,
    /// Short tag for the underlying failure family ("launch", "io", ...).
    pub kind: Option<String>,
}

/// Mutable accumulator for one run.
///
/// Owned exclusively by the run that created it; never shared across runs.
#[derive(Debug, Default, Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub logs: Vec<LogEntry>,
    pub errors: Vec<RunError>,
    pub outputs: HashMap<String, String>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a log entry with a capture-time timestamp.
    pub fn add_log(&mut self, level: LogLevel, message: impl Into<String>, step_type: Option<&str>) {
        self.logs.push(LogEntry {
            level,
            message: message.into(),
            step_type: step_type.map(str::to_string),
            timestamp: Utc::now(),
        });
    }

    /// Append an error and force the status to `Failed`.
    ///
    /// Status is never cleared again: there is no operation that reverts
    /// `Failed` or `Cancelled` back to `Success`.
    pub fn add_error(
        &mut self,
        message: impl Into<String>,
        step_type: Option<&str>,
        kind: Option<&str>,
    ) {
        self.errors.push(RunError {
            message: message.into(),
            step_type: step_type.map(str::to_string),
            kind: kind.map(str::to_string),
        });
        self.status = RunStatus::Failed;
    }

    /// Record that the cancellation flag was observed.
    pub fn mark_cancelled(&mut self) {
        self.status = RunStatus::Cancelled;
    }
}
