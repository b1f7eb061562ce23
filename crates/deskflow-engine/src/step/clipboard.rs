//! Clipboard steps.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Replace the clipboard with fixed text.
#[derive(Debug)]
pub struct SetClipboardStep {
    text: String,
}

impl SetClipboardStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("text", "")?))
    }
}

#[async_trait]
impl Step for SetClipboardStep {
    fn step_type(&self) -> &'static str {
        "set_clipboard"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        "Set clipboard text".to_string()
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                "Dry-run: skipping clipboard set",
                Some(self.step_type()),
            );
            return Ok(());
        }
        ctx.backend.set_clipboard(&self.text)?;
        result.add_log(LogLevel::Info, "Clipboard set", Some(self.step_type()));
        Ok(())
    }
}

/// Copy a named run output to the clipboard.
///
/// Erroring on a missing key is what enforces producer-before-consumer
/// ordering when composing sequences.
#[derive(Debug)]
pub struct CopyOutputStep {
    output_key: String,
}

impl CopyOutputStep {
    pub fn new(output_key: impl Into<String>) -> Self {
        Self {
            output_key: output_key.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("output_key", "")?))
    }
}

#[async_trait]
impl Step for CopyOutputStep {
    fn step_type(&self) -> &'static str {
        "copy_output"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Copy outputs['{}'] to clipboard", self.output_key)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        let Some(value) = result.outputs.get(&self.output_key).cloned() else {
            result.add_error(
                format!("Missing output: {}", self.output_key),
                Some(self.step_type()),
                None,
            );
            return Ok(());
        };
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                "Dry-run: skipping clipboard write",
                Some(self.step_type()),
            );
            return Ok(());
        }
        ctx.backend.set_clipboard(&value)?;
        result.add_log(LogLevel::Info, "Copied to clipboard", Some(self.step_type()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RunStatus;
    use crate::testutil::recording_ctx;
    use deskflow_automation::RecordedCall;

    #[tokio::test]
    async fn test_set_clipboard_writes_text() {
        let (ctx, backend) = recording_ctx(false);
        let mut result = RunResult::new();
        SetClipboardStep::new("payload").run(&ctx, &mut result).await.unwrap();

        assert_eq!(backend.clipboard_contents(), "payload");
        assert_eq!(result.logs[0].message, "Clipboard set");
    }

    #[tokio::test]
    async fn test_set_clipboard_dry_run_has_no_effect() {
        let (ctx, backend) = recording_ctx(true);
        let mut result = RunResult::new();
        SetClipboardStep::new("payload").run(&ctx, &mut result).await.unwrap();

        assert_eq!(backend.call_count(), 0);
        assert_eq!(result.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_copy_output_missing_key_errors() {
        let (ctx, backend) = recording_ctx(false);
        let mut result = RunResult::new();
        CopyOutputStep::new("rendered_text")
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.errors[0].message, "Missing output: rendered_text");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_copy_output_copies_existing_value() {
        let (ctx, backend) = recording_ctx(false);
        let mut result = RunResult::new();
        result
            .outputs
            .insert("rendered_text".to_string(), "hello".to_string());
        CopyOutputStep::new("rendered_text")
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::SetClipboard("hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_copy_output_missing_key_errors_even_in_dry_run() {
        let (ctx, _) = recording_ctx(true);
        let mut result = RunResult::new();
        CopyOutputStep::new("nope").run(&ctx, &mut result).await.unwrap();
        assert_eq!(result.status, RunStatus::Failed);
    }
}
