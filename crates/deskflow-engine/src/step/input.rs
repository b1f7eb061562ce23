//! Keyboard and pointer injection steps.

use std::time::Duration;

use async_trait::async_trait;
use deskflow_automation::MouseButton;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Press a key combination.
#[derive(Debug)]
pub struct HotkeyStep {
    keys: Vec<String>,
}

impl HotkeyStep {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.key_list("keys")?))
    }

    fn joined(&self) -> String {
        self.keys.join("+")
    }
}

#[async_trait]
impl Step for HotkeyStep {
    fn step_type(&self) -> &'static str {
        "hotkey"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Send hotkey: {}", self.joined())
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping hotkey", Some(self.step_type()));
            return Ok(());
        }
        ctx.backend.hotkey(&self.keys)?;
        result.add_log(
            LogLevel::Info,
            format!("Pressed {}", self.joined()),
            Some(self.step_type()),
        );
        Ok(())
    }
}

/// Type a fixed text as keystrokes, as fast as the backend allows.
#[derive(Debug)]
pub struct TextStep {
    text: String,
}

impl TextStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("text", "")?))
    }
}

#[async_trait]
impl Step for TextStep {
    fn step_type(&self) -> &'static str {
        "text"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Type text ({} chars)", self.text.chars().count())
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping typing", Some(self.step_type()));
            return Ok(());
        }
        ctx.backend.type_text(&self.text, Duration::ZERO)?;
        result.add_log(LogLevel::Info, "Typed text", Some(self.step_type()));
        Ok(())
    }
}

/// Type text with a per-keystroke pacing interval.
#[derive(Debug)]
pub struct TypeTextStep {
    text: String,
    interval: f64,
}

impl TypeTextStep {
    pub fn new(text: impl Into<String>, interval: f64) -> Self {
        Self {
            text: text.into(),
            interval,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("text", "")?, p.float("interval", 0.02)?))
    }
}

#[async_trait]
impl Step for TypeTextStep {
    fn step_type(&self) -> &'static str {
        "type_text"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        let summary: String = if self.text.chars().count() > 30 {
            format!("{}...", self.text.chars().take(30).collect::<String>())
        } else {
            self.text.clone()
        };
        format!("Type: {}", summary)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                "Dry-run: skipping type text",
                Some(self.step_type()),
            );
            return Ok(());
        }
        ctx.backend
            .type_text(&self.text, Duration::from_secs_f64(self.interval.max(0.0)))?;
        result.add_log(
            LogLevel::Info,
            format!("Typed {} characters", self.text.chars().count()),
            Some(self.step_type()),
        );
        Ok(())
    }
}

/// Paste the current clipboard (Ctrl+V).
#[derive(Debug)]
pub struct PasteStep;

#[async_trait]
impl Step for PasteStep {
    fn step_type(&self) -> &'static str {
        "paste"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        "Paste clipboard (Ctrl+V)".to_string()
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping paste", Some(self.step_type()));
            return Ok(());
        }
        ctx.backend
            .hotkey(&["ctrl".to_string(), "v".to_string()])?;
        result.add_log(LogLevel::Info, "Pasted clipboard", Some(self.step_type()));
        Ok(())
    }
}

/// Paste an entry from clipboard history.
///
/// TODO: wire to a clipboard-history provider once one exists; pastes the
/// current clipboard for now.
#[derive(Debug)]
pub struct PasteHistoryStep {
    history_index: u64,
}

impl PasteHistoryStep {
    pub fn new(history_index: u64) -> Self {
        Self { history_index }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.unsigned("history_index", 0)?))
    }
}

#[async_trait]
impl Step for PasteHistoryStep {
    fn step_type(&self) -> &'static str {
        "paste_history"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        const NAMES: [&str; 5] = ["last", "2nd last", "3rd last", "4th last", "5th last"];
        let name = NAMES
            .get(self.history_index as usize)
            .map(|n| (*n).to_string())
            .unwrap_or_else(|| format!("{}th", self.history_index + 1));
        format!("Paste {} clipboard item", name)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                "Dry-run: skipping paste history",
                Some(self.step_type()),
            );
            return Ok(());
        }
        ctx.backend
            .hotkey(&["ctrl".to_string(), "v".to_string()])?;
        result.add_log(
            LogLevel::Info,
            format!("Pasted from history (index {})", self.history_index),
            Some(self.step_type()),
        );
        Ok(())
    }
}

/// Click at an absolute screen position.
#[derive(Debug)]
pub struct ClickStep {
    x: i32,
    y: i32,
    button: MouseButton,
    clicks: u32,
    interval: f64,
}

impl ClickStep {
    pub fn new(x: i32, y: i32, button: MouseButton, clicks: u32, interval: f64) -> Self {
        Self {
            x,
            y,
            button,
            clicks,
            interval,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        let button = p.string("button", "left")?;
        let button = button.parse::<MouseButton>().map_err(|detail| {
            BuildError::InvalidParam {
                step_type: "click",
                key: "button",
                detail,
            }
        })?;
        Ok(Self::new(
            p.integer("x", 0)? as i32,
            p.integer("y", 0)? as i32,
            button,
            p.unsigned("clicks", 1)? as u32,
            p.float("interval", 0.1)?,
        ))
    }
}

#[async_trait]
impl Step for ClickStep {
    fn step_type(&self) -> &'static str {
        "click"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Click {} at ({}, {})", self.button, self.x, self.y)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping click", Some(self.step_type()));
            return Ok(());
        }
        ctx.backend.click(
            self.x,
            self.y,
            self.button,
            self.clicks,
            Duration::from_secs_f64(self.interval.max(0.0)),
        )?;
        result.add_log(
            LogLevel::Info,
            format!("Clicked {} at ({}, {})", self.button, self.x, self.y),
            Some(self.step_type()),
        );
        Ok(())
    }
}
