//! Action orchestrator: resolves an action definition into a live step list
//! and drives preview and execution.

use std::collections::HashMap;
use std::sync::Arc;

use deskflow_automation::AutomationBackend;
use deskflow_core::{ActionDef, ConfigStore};

use crate::cancel::CancelToken;
use crate::context::ExecutionContext;
use crate::error::{BuildError, EngineError};
use crate::result::{LogLevel, RunResult, RunStatus};
use crate::step::{step_from_spec, Step};

/// Ordered preview lines for one action, one line per step.
#[derive(Debug, Clone)]
pub struct ActionPreview {
    pub action_id: String,
    pub name: String,
    pub lines: Vec<String>,
}

/// Validates, previews, and executes data-driven actions.
pub struct ActionEngine {
    config: Arc<ConfigStore>,
    backend: Arc<dyn AutomationBackend>,
}

impl ActionEngine {
    pub fn new(config: Arc<ConfigStore>, backend: Arc<dyn AutomationBackend>) -> Self {
        Self { config, backend }
    }

    pub fn list_actions(&self) -> &[ActionDef] {
        &self.config.actions.actions
    }

    pub fn action(&self, action_id: &str) -> Option<&ActionDef> {
        self.config.action(action_id)
    }

    /// Construct fresh live steps for every spec in the action.
    ///
    /// Happens entirely before execution, so one malformed step prevents the
    /// whole action from running.
    pub fn build_steps(&self, action: &ActionDef) -> Result<Vec<Box<dyn Step>>, BuildError> {
        action
            .steps
            .iter()
            .map(|spec| step_from_spec(&spec.step_type, &spec.params))
            .collect()
    }

    /// Build the step list against a dry-run context and return its preview
    /// lines. No side effects, no run result.
    pub fn preview(
        &self,
        action_id: &str,
        inputs: HashMap<String, String>,
    ) -> Result<ActionPreview, EngineError> {
        let action = self
            .action(action_id)
            .ok_or_else(|| EngineError::UnknownAction(action_id.to_string()))?;
        let ctx = self.context(inputs, CancelToken::new(), true);
        let steps = self.build_steps(action)?;
        Ok(ActionPreview {
            action_id: action.id.clone(),
            name: action.name.clone(),
            lines: steps.iter().map(|step| step.preview(&ctx)).collect(),
        })
    }

    /// Execute an action to completion, blocking the caller for its full
    /// duration (sleeps included).
    ///
    /// Only an unknown id is an `Err`; every failure during the run itself is
    /// recorded on the returned [`RunResult`].
    pub async fn run(
        &self,
        action_id: &str,
        inputs: HashMap<String, String>,
        dry_run: bool,
        cancel: CancelToken,
    ) -> Result<RunResult, EngineError> {
        let action = self
            .action(action_id)
            .ok_or_else(|| EngineError::UnknownAction(action_id.to_string()))?;

        let mut result = RunResult::new();
        let ctx = self.context(inputs, cancel, dry_run);
        let steps = match self.build_steps(action) {
            Ok(steps) => steps,
            Err(e) => {
                result.add_error(format!("Invalid action steps: {}", e), None, Some("build"));
                return Ok(result);
            }
        };

        result.add_log(LogLevel::Info, format!("Running action: {}", action.name), None);
        execute_steps(&steps, &ctx, &mut result).await;
        Ok(result)
    }

    fn context(
        &self,
        inputs: HashMap<String, String>,
        cancel: CancelToken,
        dry_run: bool,
    ) -> ExecutionContext {
        ExecutionContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.backend),
            inputs,
            cancel,
            dry_run,
        )
    }
}

/// Drive a built step list: check cancellation before each step, log its
/// preview, execute it, and stop at the first recorded failure.
pub(crate) async fn execute_steps(
    steps: &[Box<dyn Step>],
    ctx: &ExecutionContext,
    result: &mut RunResult,
) {
    for step in steps {
        if ctx.cancel.is_cancelled() {
            result.mark_cancelled();
            result.add_log(LogLevel::Warning, "Cancelled", Some(step.step_type()));
            return;
        }
        result.add_log(LogLevel::Debug, step.preview(ctx), Some(step.step_type()));
        if let Err(e) = step.run(ctx, result).await {
            result.add_error(
                format!("Step failed: {}", e),
                Some(step.step_type()),
                Some(e.kind()),
            );
            return;
        }
        if result.status == RunStatus::Failed {
            return;
        }
    }
}
