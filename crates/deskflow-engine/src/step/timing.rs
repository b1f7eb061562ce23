//! Sleeping steps: fixed waits, counted delays, and wall-clock waits.
//!
//! These are the only steps (besides jiggle) that block for non-trivial
//! wall-clock time, so they check the cancellation flag at bounded intervals
//! instead of sleeping in one piece.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Short fixed pause in milliseconds. Sub-second scale, so it sleeps in one
/// piece without a cancellation loop.
#[derive(Debug)]
pub struct WaitStep {
    ms: u64,
}

impl WaitStep {
    pub fn new(ms: u64) -> Self {
        Self { ms }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.unsigned("ms", 250)?))
    }
}

#[async_trait]
impl Step for WaitStep {
    fn step_type(&self) -> &'static str {
        "wait"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Wait {}ms", self.ms)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping wait", Some(self.step_type()));
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(self.ms)).await;
        Ok(())
    }
}

/// Counted delay in seconds, cancellable at one-second granularity.
#[derive(Debug)]
pub struct DelayStep {
    seconds: u64,
}

impl DelayStep {
    pub fn new(seconds: u64) -> Self {
        Self { seconds }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.unsigned("seconds", 1)?))
    }
}

#[async_trait]
impl Step for DelayStep {
    fn step_type(&self) -> &'static str {
        "delay"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        if self.seconds >= 60 {
            format!("Wait {} minute(s)", self.seconds / 60)
        } else {
            format!("Wait {} second(s)", self.seconds)
        }
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping delay", Some(self.step_type()));
            return Ok(());
        }
        let mut remaining = self.seconds;
        while remaining > 0 {
            if ctx.cancel.is_cancelled() {
                result.mark_cancelled();
                result.add_log(LogLevel::Warning, "Cancelled delay", Some(self.step_type()));
                return Ok(());
            }
            let chunk = remaining.min(1);
            tokio::time::sleep(Duration::from_secs(chunk)).await;
            remaining -= chunk;
        }
        Ok(())
    }
}

/// Wait until the next occurrence of a 24-hour "HH:MM" wall-clock time,
/// cancellable at five-second granularity.
#[derive(Debug)]
pub struct WaitUntilStep {
    target_time: String,
}

impl WaitUntilStep {
    pub fn new(target_time: impl Into<String>) -> Self {
        Self {
            target_time: target_time.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("time", "")?))
    }
}

#[async_trait]
impl Step for WaitUntilStep {
    fn step_type(&self) -> &'static str {
        "wait_until"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Wait until {}", self.target_time)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                format!("Dry-run: skipping wait until {}", self.target_time),
                Some(self.step_type()),
            );
            return Ok(());
        }
        let target = match NaiveTime::parse_from_str(&self.target_time, "%H:%M") {
            Ok(t) => t,
            Err(_) => {
                result.add_error(
                    format!("Invalid time format: {}", self.target_time),
                    Some(self.step_type()),
                    None,
                );
                return Ok(());
            }
        };
        let now = Local::now().naive_local();
        let mut remaining = (next_occurrence(target, now) - now).num_seconds().max(0) as u64;
        while remaining > 0 {
            if ctx.cancel.is_cancelled() {
                result.mark_cancelled();
                result.add_log(
                    LogLevel::Warning,
                    "Cancelled scheduled wait",
                    Some(self.step_type()),
                );
                return Ok(());
            }
            let chunk = remaining.min(5);
            tokio::time::sleep(Duration::from_secs(chunk)).await;
            remaining -= chunk;
        }
        Ok(())
    }
}

/// Next moment `target` occurs strictly after `now`; a time already passed
/// today rolls to tomorrow.
pub fn next_occurrence(target: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let mut next = now.date().and_time(target);
    if next <= now {
        next += TimeDelta::days(1);
    }
    next
}
