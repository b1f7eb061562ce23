//! Window-focus steps.

use std::str::FromStr;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// What to do when the wanted window cannot be found or does not match:
/// log a warning and continue, or record an error and halt the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnFail {
    #[default]
    Warn,
    Fail,
}

impl FromStr for OnFail {
    type Err = std::convert::Infallible;

    // Anything that is not "fail" means warn.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "fail" {
            Ok(OnFail::Fail)
        } else {
            Ok(OnFail::Warn)
        }
    }
}

fn report(policy: OnFail, message: String, step_type: &str, result: &mut RunResult) {
    match policy {
        OnFail::Fail => result.add_error(message, Some(step_type), None),
        OnFail::Warn => result.add_log(LogLevel::Warning, message, Some(step_type)),
    }
}

/// Verify that the currently active window's title contains a substring.
/// Read-only; runs the same check in dry-run mode.
#[derive(Debug)]
pub struct FocusWindowStep {
    title_substring: String,
    on_fail: OnFail,
}

impl FocusWindowStep {
    pub fn new(title_substring: impl Into<String>, on_fail: OnFail) -> Self {
        Self {
            title_substring: title_substring.into(),
            on_fail,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        let on_fail = p.string("on_fail", "warn")?.parse().unwrap_or_default();
        Ok(Self::new(p.string("title", "")?, on_fail))
    }
}

#[async_trait]
impl Step for FocusWindowStep {
    fn step_type(&self) -> &'static str {
        "focus_window"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Ensure window with '{}' is focused", self.title_substring)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        let title = match ctx.backend.active_window_title() {
            Ok(Some(title)) => title,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Active window lookup failed");
                String::new()
            }
        };
        if !title.is_empty()
            && title
                .to_lowercase()
                .contains(&self.title_substring.to_lowercase())
        {
            result.add_log(
                LogLevel::Info,
                format!("Focus OK: {}", title),
                Some(self.step_type()),
            );
            return Ok(());
        }
        let message = format!(
            "Active window mismatch (expected contains '{}', got '{}')",
            self.title_substring, title
        );
        report(self.on_fail, message, self.step_type(), result);
        Ok(())
    }
}

/// Bring a window matching a title substring to the foreground.
#[derive(Debug)]
pub struct FocusAppStep {
    title_substring: String,
    on_fail: OnFail,
}

impl FocusAppStep {
    pub fn new(title_substring: impl Into<String>, on_fail: OnFail) -> Self {
        Self {
            title_substring: title_substring.into(),
            on_fail,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        let on_fail = p.string("on_fail", "warn")?.parse().unwrap_or_default();
        Ok(Self::new(p.string("title", "")?, on_fail))
    }
}

#[async_trait]
impl Step for FocusAppStep {
    fn step_type(&self) -> &'static str {
        "focus_app"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Focus app window containing '{}'", self.title_substring)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                format!("Dry-run: focus window '{}'", self.title_substring),
                Some(self.step_type()),
            );
            return Ok(());
        }
        match ctx.backend.focus_window(&self.title_substring) {
            Ok(Some(title)) => {
                result.add_log(
                    LogLevel::Info,
                    format!("Focused '{}'", title),
                    Some(self.step_type()),
                );
            }
            Ok(None) => {
                let message = format!("No window found containing '{}'", self.title_substring);
                report(self.on_fail, message, self.step_type(), result);
            }
            Err(e) => {
                let message = format!("Window activation failed: {}", e);
                report(self.on_fail, message, self.step_type(), result);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RunStatus;
    use crate::testutil::recording_ctx;

    #[test]
    fn test_on_fail_parsing() {
        assert_eq!("fail".parse::<OnFail>().unwrap(), OnFail::Fail);
        assert_eq!("warn".parse::<OnFail>().unwrap(), OnFail::Warn);
        assert_eq!("anything".parse::<OnFail>().unwrap(), OnFail::Warn);
    }

    #[tokio::test]
    async fn test_focus_window_match_logs_ok() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_active_window(Some("Notes - Editor"));
        let mut result = RunResult::new();
        FocusWindowStep::new("editor", OnFail::Fail)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert!(result.logs[0].message.starts_with("Focus OK"));
    }

    #[tokio::test]
    async fn test_focus_window_mismatch_warn_continues() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_active_window(Some("Terminal"));
        let mut result = RunResult::new();
        FocusWindowStep::new("editor", OnFail::Warn)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.logs[0].level, LogLevel::Warning);
        assert!(result.logs[0].message.contains("Active window mismatch"));
    }

    #[tokio::test]
    async fn test_focus_window_mismatch_fail_halts() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_active_window(Some("Terminal"));
        let mut result = RunResult::new();
        FocusWindowStep::new("editor", OnFail::Fail)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_focus_app_activates_matching_window() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_windows(&["Mail", "Code Editor"]);
        let mut result = RunResult::new();
        FocusAppStep::new("editor", OnFail::Warn)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.logs[0].message, "Focused 'Code Editor'");
    }

    #[tokio::test]
    async fn test_focus_app_not_found_respects_policy() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_windows(&["Mail"]);

        let mut result = RunResult::new();
        FocusAppStep::new("editor", OnFail::Warn)
            .run(&ctx, &mut result)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.logs[0].level, LogLevel::Warning);

        let mut result = RunResult::new();
        FocusAppStep::new("editor", OnFail::Fail)
            .run(&ctx, &mut result)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.errors[0].message.contains("No window found"));
    }

    #[tokio::test]
    async fn test_focus_app_dry_run_no_activation() {
        let (ctx, backend) = recording_ctx(true);
        let mut result = RunResult::new();
        FocusAppStep::new("editor", OnFail::Warn)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 0);
        assert!(result.logs[0].message.starts_with("Dry-run"));
    }
}
