//! Macro orchestrator.
//!
//! Same execution contract as the action orchestrator, plus two build-time
//! responsibilities: best-effort `{name}` substitution of runtime inputs into
//! step parameters, and a schedule prefix (wait-until, delay, focus-app)
//! assembled from macro metadata ahead of the macro's own steps.

use std::collections::HashMap;
use std::sync::Arc;

use deskflow_automation::AutomationBackend;
use deskflow_core::{ConfigStore, MacroDef};
use serde_json::{Map, Value};

use crate::cancel::CancelToken;
use crate::context::ExecutionContext;
use crate::engine::execute_steps;
use crate::error::{BuildError, EngineError};
use crate::result::{LogLevel, RunResult};
use crate::step::{
    step_from_spec, DelayStep, FocusAppStep, OnFail, Step, WaitUntilStep,
};

/// Validates, previews, and runs macros.
pub struct MacroEngine {
    config: Arc<ConfigStore>,
    backend: Arc<dyn AutomationBackend>,
}

impl MacroEngine {
    pub fn new(config: Arc<ConfigStore>, backend: Arc<dyn AutomationBackend>) -> Self {
        Self { config, backend }
    }

    /// Enabled macros only; disabled ones are hidden from listings but still
    /// resolvable by id.
    pub fn list_macros(&self) -> Vec<&MacroDef> {
        self.config
            .macros
            .macros
            .iter()
            .filter(|m| m.enabled)
            .collect()
    }

    pub fn macro_def(&self, macro_id: &str) -> Option<&MacroDef> {
        self.config.macro_def(macro_id)
    }

    /// Build the full step list: schedule prefix first (wait-until, then
    /// delay, then focus-app — both waits apply additively when both are
    /// set), then the macro's own steps with inputs substituted into their
    /// parameters.
    pub fn build_steps(
        &self,
        macro_def: &MacroDef,
        inputs: &HashMap<String, String>,
    ) -> Result<Vec<Box<dyn Step>>, BuildError> {
        let mut steps: Vec<Box<dyn Step>> = Vec::new();
        if let Some(time) = macro_def.schedule_time.as_deref().filter(|t| !t.is_empty()) {
            steps.push(Box::new(WaitUntilStep::new(time)));
        }
        if let Some(seconds) = macro_def.schedule_delay.filter(|s| *s > 0) {
            steps.push(Box::new(DelayStep::new(seconds)));
        }
        if let Some(title) = macro_def.app_title.as_deref().filter(|t| !t.is_empty()) {
            steps.push(Box::new(FocusAppStep::new(title, OnFail::Warn)));
        }
        for spec in &macro_def.steps {
            let params = resolve_params(&spec.params, inputs);
            steps.push(step_from_spec(&spec.step_type, &params)?);
        }
        Ok(steps)
    }

    /// Preview lines for the full step list (schedule prefix included),
    /// against a dry-run context. No side effects.
    pub fn preview(
        &self,
        macro_id: &str,
        inputs: HashMap<String, String>,
    ) -> Result<Vec<String>, EngineError> {
        let macro_def = self
            .macro_def(macro_id)
            .ok_or_else(|| EngineError::UnknownMacro(macro_id.to_string()))?;
        let steps = self.build_steps(macro_def, &inputs)?;
        let ctx = self.context(inputs, CancelToken::new(), true);
        Ok(steps.iter().map(|step| step.preview(&ctx)).collect())
    }

    /// Execute a macro to completion. Same contract as the action engine:
    /// only an unknown id is an `Err`.
    pub async fn run(
        &self,
        macro_id: &str,
        inputs: HashMap<String, String>,
        dry_run: bool,
        cancel: CancelToken,
    ) -> Result<RunResult, EngineError> {
        let macro_def = self
            .macro_def(macro_id)
            .ok_or_else(|| EngineError::UnknownMacro(macro_id.to_string()))?;

        let mut result = RunResult::new();
        let steps = match self.build_steps(macro_def, &inputs) {
            Ok(steps) => steps,
            Err(e) => {
                result.add_error(format!("Invalid macro steps: {}", e), None, Some("build"));
                return Ok(result);
            }
        };
        let ctx = self.context(inputs, cancel, dry_run);

        result.add_log(
            LogLevel::Info,
            format!("Running macro: {}", macro_def.name),
            None,
        );
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

/// Substitute every string parameter, recursing through lists and maps.
/// Strings that fail substitution stay unchanged.
pub(crate) fn resolve_params(
    params: &Map<String, Value>,
    inputs: &HashMap<String, String>,
) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), resolve_value(value, inputs)))
        .collect()
}

fn resolve_value(value: &Value, inputs: &HashMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(s, inputs).unwrap_or_else(|| s.clone())),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| resolve_value(v, inputs)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, inputs)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Best-effort `{name}` substitution.
///
/// `{{` and `}}` escape to literal braces. Returns `None` — leave the
/// original text untouched — on any referenced name missing from `inputs` or
/// any malformed pattern (unbalanced or stray braces). Macro authors rely on
/// literal brace-containing text surviving unresolved placeholders.
fn substitute(text: &str, inputs: &HashMap<String, String>) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return None,
                    }
                }
                out.push_str(inputs.get(&name)?);
            }
            '}' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RunStatus;
    use deskflow_automation::{RecordedCall, RecordingBackend};
    use deskflow_core::StepSpec;
    use serde_json::json;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn spec(step_type: &str, params: serde_json::Value) -> StepSpec {
        StepSpec::new(step_type, params.as_object().unwrap().clone())
    }

    fn base_macro(id: &str) -> MacroDef {
        MacroDef {
            id: id.to_string(),
            name: format!("Macro {}", id),
            description: String::new(),
            category: "general".to_string(),
            enabled: true,
            hotkey: None,
            safety: deskflow_core::MacroSafety::Safe,
            steps: vec![],
            schedule_time: None,
            schedule_delay: None,
            app_title: None,
        }
    }

    fn engine_with(macros: Vec<MacroDef>) -> (MacroEngine, Arc<RecordingBackend>) {
        let mut config = ConfigStore::default();
        config.macros.macros = macros;
        let backend = Arc::new(RecordingBackend::new());
        let engine = MacroEngine::new(Arc::new(config), backend.clone());
        (engine, backend)
    }

    // ---- substitution ----

    #[test]
    fn test_substitute_replaces_known_names() {
        let out = substitute("Hello {name}!", &inputs(&[("name", "Ada")]));
        assert_eq!(out.as_deref(), Some("Hello Ada!"));
    }

    #[test]
    fn test_substitute_missing_name_leaves_original() {
        assert_eq!(substitute("Hello {missing}!", &inputs(&[])), None);
    }

    #[test]
    fn test_substitute_escaped_braces() {
        let out = substitute("{{literal}} and {name}", &inputs(&[("name", "v")]));
        assert_eq!(out.as_deref(), Some("{literal} and v"));
    }

    #[test]
    fn test_substitute_malformed_patterns_leave_original() {
        assert_eq!(substitute("unbalanced {", &inputs(&[])), None);
        assert_eq!(substitute("stray } brace", &inputs(&[])), None);
    }

    #[test]
    fn test_resolve_params_recurses_lists_and_maps() {
        let params = json!({
            "text": "Hi {name}",
            "sources": ["{dir}/a.txt", "plain"],
            "nested": {"inner": "{name}"},
            "count": 3,
        });
        let resolved = resolve_params(
            params.as_object().unwrap(),
            &inputs(&[("name", "Ada"), ("dir", "/tmp")]),
        );
        assert_eq!(resolved["text"], "Hi Ada");
        assert_eq!(resolved["sources"][0], "/tmp/a.txt");
        assert_eq!(resolved["sources"][1], "plain");
        assert_eq!(resolved["nested"]["inner"], "Ada");
        assert_eq!(resolved["count"], 3);
    }

    #[test]
    fn test_resolve_params_unresolved_placeholder_kept_verbatim() {
        let params = json!({"text": "keep {unknown} as-is"});
        let resolved = resolve_params(params.as_object().unwrap(), &inputs(&[]));
        assert_eq!(resolved["text"], "keep {unknown} as-is");
    }

    // ---- schedule prefix ----

    #[test]
    fn test_delay_prefix_before_own_steps() {
        let mut mac = base_macro("m1");
        mac.schedule_delay = Some(2);
        mac.steps = vec![spec("open_url", json!({"url": "https://example.com"}))];
        let (engine, _) = engine_with(vec![mac]);

        let lines = engine.preview("m1", HashMap::new()).unwrap();
        assert_eq!(lines, vec!["Wait 2 second(s)", "Open URL: https://example.com"]);
    }

    #[test]
    fn test_full_prefix_order_is_wait_delay_focus() {
        let mut mac = base_macro("m1");
        mac.schedule_time = Some("09:00".to_string());
        mac.schedule_delay = Some(5);
        mac.app_title = Some("Editor".to_string());
        mac.steps = vec![spec("paste", json!({}))];
        let (engine, _) = engine_with(vec![mac]);

        let lines = engine.preview("m1", HashMap::new()).unwrap();
        assert_eq!(
            lines,
            vec![
                "Wait until 09:00",
                "Wait 5 second(s)",
                "Focus app window containing 'Editor'",
                "Paste clipboard (Ctrl+V)",
            ]
        );
    }

    #[test]
    fn test_zero_delay_and_empty_strings_emit_no_prefix() {
        let mut mac = base_macro("m1");
        mac.schedule_time = Some(String::new());
        mac.schedule_delay = Some(0);
        mac.app_title = Some(String::new());
        let (engine, _) = engine_with(vec![mac]);

        let lines = engine.preview("m1", HashMap::new()).unwrap();
        assert!(lines.is_empty());
    }

    // ---- listing and lookup ----

    #[test]
    fn test_list_macros_excludes_disabled() {
        let mut disabled = base_macro("off");
        disabled.enabled = false;
        let (engine, _) = engine_with(vec![base_macro("on"), disabled]);

        let listed = engine.list_macros();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "on");
        // Disabled macros stay resolvable by id.
        assert!(engine.macro_def("off").is_some());
    }

    #[test]
    fn test_preview_unknown_macro_errors() {
        let (engine, _) = engine_with(vec![]);
        let err = engine.preview("ghost", HashMap::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownMacro(_)));
    }

    // ---- running ----

    #[tokio::test]
    async fn test_run_substitutes_inputs_into_params() {
        let mut mac = base_macro("m1");
        mac.steps = vec![spec("set_clipboard", json!({"text": "Hello {name}"}))];
        let (engine, backend) = engine_with(vec![mac]);

        let result = engine
            .run("m1", inputs(&[("name", "Ada")]), false, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::SetClipboard("Hello Ada".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_empty_macro_succeeds() {
        let (engine, _) = engine_with(vec![base_macro("m1")]);
        let result = engine
            .run("m1", HashMap::new(), false, CancelToken::new())
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_run_invalid_step_becomes_single_error() {
        let mut mac = base_macro("m1");
        mac.steps = vec![spec("teleport", json!({}))];
        let (engine, backend) = engine_with(vec![mac]);

        let result = engine
            .run("m1", HashMap::new(), false, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("Invalid macro steps"));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_unknown_macro_is_an_api_error() {
        let (engine, _) = engine_with(vec![]);
        let err = engine
            .run("ghost", HashMap::new(), false, CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownMacro(_)));
    }

    #[tokio::test]
    async fn test_run_cancelled_before_first_step() {
        let mut mac = base_macro("m1");
        mac.steps = vec![spec("set_clipboard", json!({"text": "x"}))];
        let (engine, backend) = engine_with(vec![mac]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = engine.run("m1", HashMap::new(), false, cancel).await.unwrap();
        assert_eq!(result.status, RunStatus::Cancelled);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_dry_macro_with_prefix_logs_only() {
        let mut mac = base_macro("m1");
        mac.schedule_delay = Some(2);
        mac.steps = vec![spec("open_url", json!({"url": "https://example.com"}))];
        let (engine, backend) = engine_with(vec![mac]);

        let result = engine
            .run("m1", HashMap::new(), true, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(backend.call_count(), 0);
        // One INFO header, then DEBUG preview + INFO skip per step.
        assert!(result.logs.len() >= 5);
    }
}
