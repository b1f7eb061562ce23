//! Step abstraction and registry.
//!
//! A step is the smallest unit of automation work. Every kind implements
//! [`Step`]: a pure `preview` line and an effectful `run`. The registry
//! constructs a fresh boxed step from a stored `(type, params)` spec; all
//! parameter coercion happens here, before execution starts, so a single
//! malformed step prevents the whole sequence from running.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::RunResult;

pub mod clipboard;
pub mod files;
pub mod input;
pub mod jiggle;
pub mod launch;
pub mod template;
pub mod timing;
pub mod window;

pub use clipboard::{CopyOutputStep, SetClipboardStep};
pub use files::{MoveFileStep, MoveFilesStep};
pub use input::{ClickStep, HotkeyStep, PasteHistoryStep, PasteStep, TextStep, TypeTextStep};
pub use jiggle::{JigglePattern, JiggleStep};
pub use launch::{LaunchProfileStep, OpenAppStep, OpenUrlStep, RunCommandStep};
pub use template::RenderTemplateStep;
pub use timing::{DelayStep, WaitStep, WaitUntilStep};
pub use window::{FocusAppStep, FocusWindowStep, OnFail};

/// Polymorphic unit of automation work.
#[async_trait]
pub trait Step: Send + Sync + std::fmt::Debug {
    /// Registry key of this step kind; tags log and error entries.
    fn step_type(&self) -> &'static str;

    /// One human-readable line describing what `run` would do.
    ///
    /// Pure: no side effects, safe to call any number of times.
    fn preview(&self, ctx: &ExecutionContext) -> String;

    /// Execute against the shared context and result.
    ///
    /// With `ctx.dry_run` set, the step logs an informational "skipped" line
    /// and performs no external effect. Steps may record failures directly on
    /// `result`; a returned error is recorded by the orchestrator instead.
    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError>;
}

/// Construct a live step from a stored type key and parameter bag.
pub fn step_from_spec(
    step_type: &str,
    params: &Map<String, Value>,
) -> Result<Box<dyn Step>, BuildError> {
    let p = Params::new(step_type_key(step_type), params);
    match step_type {
        "wait" => Ok(Box::new(WaitStep::from_params(&p)?)),
        "delay" => Ok(Box::new(DelayStep::from_params(&p)?)),
        "wait_until" => Ok(Box::new(WaitUntilStep::from_params(&p)?)),
        "launch_profile" => Ok(Box::new(LaunchProfileStep::from_params(&p)?)),
        "render_template" => Ok(Box::new(RenderTemplateStep::from_params(&p)?)),
        "copy_output" => Ok(Box::new(CopyOutputStep::from_params(&p)?)),
        "hotkey" => Ok(Box::new(HotkeyStep::from_params(&p)?)),
        "text" => Ok(Box::new(TextStep::from_params(&p)?)),
        "type_text" => Ok(Box::new(TypeTextStep::from_params(&p)?)),
        "paste" => Ok(Box::new(PasteStep)),
        "paste_history" => Ok(Box::new(PasteHistoryStep::from_params(&p)?)),
        "set_clipboard" => Ok(Box::new(SetClipboardStep::from_params(&p)?)),
        "open_app" => Ok(Box::new(OpenAppStep::from_params(&p)?)),
        "open_url" => Ok(Box::new(OpenUrlStep::from_params(&p)?)),
        "run" => Ok(Box::new(RunCommandStep::from_params(&p)?)),
        "move_file" => Ok(Box::new(MoveFileStep::from_params(&p)?)),
        "move_files" => Ok(Box::new(MoveFilesStep::from_params(&p)?)),
        "focus_window" => Ok(Box::new(FocusWindowStep::from_params(&p)?)),
        "focus_app" => Ok(Box::new(FocusAppStep::from_params(&p)?)),
        "click" => Ok(Box::new(ClickStep::from_params(&p)?)),
        "jiggle" => Ok(Box::new(JiggleStep::from_params(&p)?)),
        other => Err(BuildError::UnknownStepType(other.to_string())),
    }
}

/// Interns the matched key so error messages can borrow it statically.
fn step_type_key(step_type: &str) -> &'static str {
    match step_type {
        "wait" => "wait",
        "delay" => "delay",
        "wait_until" => "wait_until",
        "launch_profile" => "launch_profile",
        "render_template" => "render_template",
        "copy_output" => "copy_output",
        "hotkey" => "hotkey",
        "text" => "text",
        "type_text" => "type_text",
        "paste" => "paste",
        "paste_history" => "paste_history",
        "set_clipboard" => "set_clipboard",
        "open_app" => "open_app",
        "open_url" => "open_url",
        "run" => "run",
        "move_file" => "move_file",
        "move_files" => "move_files",
        "focus_window" => "focus_window",
        "focus_app" => "focus_app",
        "click" => "click",
        "jiggle" => "jiggle",
        _ => "unknown",
    }
}

/// Typed view over a raw parameter bag.
///
/// Missing keys take the step's default; present keys are coerced (numeric
/// strings parse, scalars stringify) and anything uncoercible is a
/// [`BuildError`].
pub(crate) struct Params<'a> {
    step_type: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(step_type: &'static str, map: &'a Map<String, Value>) -> Self {
        Self { step_type, map }
    }

    fn invalid(&self, key: &'static str, detail: impl Into<String>) -> BuildError {
        BuildError::InvalidParam {
            step_type: self.step_type,
            key,
            detail: detail.into(),
        }
    }

    pub fn string(&self, key: &'static str, default: &str) -> Result<String, BuildError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(self.invalid(key, format!("expected a string, got {}", other))),
        }
    }

    pub fn integer(&self, key: &'static str, default: i64) -> Result<i64, BuildError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| self.invalid(key, "expected an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.invalid(key, format!("cannot parse '{}' as an integer", s))),
            Some(other) => Err(self.invalid(key, format!("expected an integer, got {}", other))),
        }
    }

    /// Like [`Params::integer`], with negatives clamped to zero (durations
    /// and counts treat below-zero values as "none").
    pub fn unsigned(&self, key: &'static str, default: u64) -> Result<u64, BuildError> {
        Ok(self.integer(key, default as i64)?.max(0) as u64)
    }

    pub fn float(&self, key: &'static str, default: f64) -> Result<f64, BuildError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.invalid(key, "expected a number")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.invalid(key, format!("cannot parse '{}' as a number", s))),
            Some(other) => Err(self.invalid(key, format!("expected a number, got {}", other))),
        }
    }

    pub fn boolean(&self, key: &'static str, default: bool) -> Result<bool, BuildError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Some(Value::String(s)) => Ok(!s.is_empty()),
            Some(other) => Err(self.invalid(key, format!("expected a boolean, got {}", other))),
        }
    }

    /// A list of strings; scalar elements are stringified. Missing is empty.
    pub fn string_list(&self, key: &'static str) -> Result<Vec<String>, BuildError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    other => Err(self.invalid(key, format!("expected string items, got {}", other))),
                })
                .collect(),
            Some(other) => Err(self.invalid(key, format!("expected a list, got {}", other))),
        }
    }

    /// A key combination: either a list of key names or a "+"-joined string.
    pub fn key_list(&self, key: &'static str) -> Result<Vec<String>, BuildError> {
        match self.map.get(key) {
            Some(Value::String(s)) => Ok(s.split('+').map(str::to_string).collect()),
            _ => self.string_list(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_registry_constructs_every_known_type() {
        let specs: Vec<(&str, Value)> = vec![
            ("wait", json!({"ms": 10})),
            ("delay", json!({"seconds": 2})),
            ("wait_until", json!({"time": "09:00"})),
            ("launch_profile", json!({"profile": "Work"})),
            ("render_template", json!({"template_id": "t1"})),
            ("copy_output", json!({"output_key": "rendered_text"})),
            ("hotkey", json!({"keys": ["ctrl", "v"]})),
            ("text", json!({"text": "hello"})),
            ("type_text", json!({"text": "hello"})),
            ("paste", json!({})),
            ("paste_history", json!({"history_index": 1})),
            ("set_clipboard", json!({"text": "hi"})),
            ("open_app", json!({"path": "/usr/bin/ed"})),
            ("open_url", json!({"url": "https://example.com"})),
            ("run", json!({"command": "true"})),
            ("move_file", json!({"src": "a", "dest": "b"})),
            ("move_files", json!({"sources": ["a"], "dest": "b"})),
            ("focus_window", json!({"title": "Editor"})),
            ("focus_app", json!({"title": "Editor"})),
            ("click", json!({"x": 10, "y": 20})),
            ("jiggle", json!({"duration": 5})),
        ];
        for (step_type, raw) in specs {
            let step = step_from_spec(step_type, &params(raw)).unwrap();
            assert_eq!(step.step_type(), step_type, "type key mismatch");
        }
    }

    #[tokio::test]
    async fn test_dry_run_has_no_external_effect_for_any_step_type() {
        use crate::result::{LogLevel, RunResult};
        use deskflow_core::{ConfigStore, TemplateDef};
        use std::collections::HashMap;

        let mut config = ConfigStore::default();
        config
            .profiles
            .profiles
            .insert("Work".to_string(), vec!["https://example.com".to_string()]);
        config.templates.templates.push(TemplateDef {
            id: "t1".to_string(),
            name: "T1".to_string(),
            category: "general".to_string(),
            fields: vec![],
            body: "hi".to_string(),
            hotkey: None,
        });
        let (ctx, backend) =
            crate::testutil::recording_ctx_with(config, HashMap::new(), true);
        backend.script_active_window(Some("Editor"));

        let specs: Vec<(&str, Value)> = vec![
            ("wait", json!({"ms": 10})),
            ("delay", json!({"seconds": 3600})),
            ("wait_until", json!({"time": "09:00"})),
            ("launch_profile", json!({"profile": "Work"})),
            ("render_template", json!({"template_id": "t1", "output_key": "out"})),
            ("copy_output", json!({"output_key": "out"})),
            ("hotkey", json!({"keys": ["ctrl", "v"]})),
            ("text", json!({"text": "hello"})),
            ("type_text", json!({"text": "hello"})),
            ("paste", json!({})),
            ("paste_history", json!({})),
            ("set_clipboard", json!({"text": "hi"})),
            ("open_app", json!({"path": "/usr/bin/ed"})),
            ("open_url", json!({"url": "https://example.com"})),
            ("run", json!({"command": "true"})),
            ("move_file", json!({"src": "a", "dest": "b"})),
            ("move_files", json!({"sources": ["a"], "dest": "b"})),
            ("focus_window", json!({"title": "Editor"})),
            ("focus_app", json!({"title": "Editor"})),
            ("click", json!({"x": 10, "y": 20})),
            ("jiggle", json!({"duration": 60})),
        ];
        let mut result = RunResult::new();
        for (step_type, raw) in specs {
            let step = step_from_spec(step_type, &params(raw)).unwrap();
            let logs_before = result.logs.len();
            step.run(&ctx, &mut result).await.unwrap();
            assert!(
                result.logs.len() > logs_before,
                "step '{}' logged nothing in dry-run",
                step_type
            );
        }

        assert_eq!(backend.call_count(), 0, "dry-run performed external effects");
        assert!(result.errors.is_empty());
        assert!(result
            .logs
            .iter()
            .all(|log| log.level == LogLevel::Info || log.level == LogLevel::Warning));
    }

    #[test]
    fn test_registry_rejects_unknown_type() {
        let err = step_from_spec("teleport", &Map::new()).unwrap_err();
        assert!(matches!(err, BuildError::UnknownStepType(t) if t == "teleport"));
    }

    #[test]
    fn test_registry_rejects_uncoercible_param() {
        let err = step_from_spec("delay", &params(json!({"seconds": "soon"}))).unwrap_err();
        assert!(matches!(err, BuildError::InvalidParam { .. }));
    }

    #[test]
    fn test_integer_accepts_numeric_string() {
        let map = params(json!({"seconds": "5"}));
        let p = Params::new("delay", &map);
        assert_eq!(p.integer("seconds", 1).unwrap(), 5);
    }

    #[test]
    fn test_integer_default_when_missing() {
        let map = Map::new();
        let p = Params::new("delay", &map);
        assert_eq!(p.integer("seconds", 1).unwrap(), 1);
    }

    #[test]
    fn test_unsigned_clamps_negatives() {
        let map = params(json!({"seconds": -4}));
        let p = Params::new("delay", &map);
        assert_eq!(p.unsigned("seconds", 1).unwrap(), 0);
    }

    #[test]
    fn test_string_stringifies_scalars() {
        let map = params(json!({"path": 42}));
        let p = Params::new("open_app", &map);
        assert_eq!(p.string("path", "").unwrap(), "42");
    }

    #[test]
    fn test_string_rejects_compound_values() {
        let map = params(json!({"path": ["a", "b"]}));
        let p = Params::new("open_app", &map);
        assert!(p.string("path", "").is_err());
    }

    #[test]
    fn test_boolean_coercions() {
        let map = params(json!({"a": true, "b": 0, "c": "yes", "d": ""}));
        let p = Params::new("jiggle", &map);
        assert!(p.boolean("a", false).unwrap());
        assert!(!p.boolean("b", true).unwrap());
        assert!(p.boolean("c", false).unwrap());
        assert!(!p.boolean("d", true).unwrap());
        assert!(p.boolean("missing", true).unwrap());
    }

    #[test]
    fn test_key_list_splits_joined_string() {
        let map = params(json!({"keys": "ctrl+shift+s"}));
        let p = Params::new("hotkey", &map);
        assert_eq!(p.key_list("keys").unwrap(), vec!["ctrl", "shift", "s"]);
    }

    #[test]
    fn test_key_list_accepts_list() {
        let map = params(json!({"keys": ["ctrl", "v"]}));
        let p = Params::new("hotkey", &map);
        assert_eq!(p.key_list("keys").unwrap(), vec!["ctrl", "v"]);
    }

    #[test]
    fn test_string_list_rejects_scalar() {
        let map = params(json!({"sources": "a.txt"}));
        let p = Params::new("move_files", &map);
        assert!(p.string_list("sources").is_err());
    }
}
