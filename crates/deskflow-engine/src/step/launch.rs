//! Steps that launch external targets: URLs, apps, shell commands, and named
//! profiles of multiple targets.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Open one target: URL scheme goes to the system handler, an existing path
/// to its associated app, anything else is treated as a shell command.
///
/// Launch failures are recorded on the result (no second error propagates).
fn launch_target(target: &str, ctx: &ExecutionContext, result: &mut RunResult, step_type: &str) {
    if target.to_lowercase().starts_with("http://") || target.to_lowercase().starts_with("https://")
    {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                format!("Dry-run: would open URL {}", target),
                Some(step_type),
            );
            return;
        }
        match ctx.backend.open_url(target) {
            Ok(()) => result.add_log(
                LogLevel::Info,
                format!("Opened URL: {}", target),
                Some(step_type),
            ),
            Err(e) => result.add_error(
                format!("Failed to launch '{}': {}", target, e),
                Some(step_type),
                Some(e.kind()),
            ),
        }
        return;
    }

    if ctx.dry_run {
        result.add_log(
            LogLevel::Info,
            format!("Dry-run: would launch {}", target),
            Some(step_type),
        );
        return;
    }

    let path = Path::new(target);
    let launched = if path.exists() {
        ctx.backend.open_path(path)
    } else {
        ctx.backend.spawn_command(target)
    };
    match launched {
        Ok(()) => result.add_log(
            LogLevel::Info,
            format!("Launched: {}", target),
            Some(step_type),
        ),
        Err(e) => result.add_error(
            format!("Failed to launch '{}': {}", target, e),
            Some(step_type),
            Some(e.kind()),
        ),
    }
}

/// Open an application or document path.
#[derive(Debug)]
pub struct OpenAppStep {
    path: String,
}

impl OpenAppStep {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("path", "")?))
    }
}

#[async_trait]
impl Step for OpenAppStep {
    fn step_type(&self) -> &'static str {
        "open_app"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Open app: {}", self.path)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        launch_target(&self.path, ctx, result, self.step_type());
        Ok(())
    }
}

/// Open a URL with the default handler.
#[derive(Debug)]
pub struct OpenUrlStep {
    url: String,
}

impl OpenUrlStep {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("url", "")?))
    }
}

#[async_trait]
impl Step for OpenUrlStep {
    fn step_type(&self) -> &'static str {
        "open_url"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Open URL: {}", self.url)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        launch_target(&self.url, ctx, result, self.step_type());
        Ok(())
    }
}

/// Start a shell command without waiting for it.
#[derive(Debug)]
pub struct RunCommandStep {
    command: String,
}

impl RunCommandStep {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("command", "")?))
    }
}

#[async_trait]
impl Step for RunCommandStep {
    fn step_type(&self) -> &'static str {
        "run"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Run command: {}", self.command)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                format!("Dry-run: would run {}", self.command),
                Some(self.step_type()),
            );
            return Ok(());
        }
        match ctx.backend.spawn_command(&self.command) {
            Ok(()) => result.add_log(
                LogLevel::Info,
                format!("Started command: {}", self.command),
                Some(self.step_type()),
            ),
            Err(e) => result.add_error(
                format!("Command failed: {}", e),
                Some(self.step_type()),
                Some(e.kind()),
            ),
        }
        Ok(())
    }
}

/// Launch every target of a named profile in order, pausing between targets.
#[derive(Debug)]
pub struct LaunchProfileStep {
    profile: String,
    delay_ms: u64,
}

impl LaunchProfileStep {
    pub fn new(profile: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            profile: profile.into(),
            delay_ms,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("profile", "")?, p.unsigned("delay_ms", 300)?))
    }
}

#[async_trait]
impl Step for LaunchProfileStep {
    fn step_type(&self) -> &'static str {
        "launch_profile"
    }

    fn preview(&self, ctx: &ExecutionContext) -> String {
        let count = ctx
            .config
            .profile_targets(&self.profile)
            .map_or(0, <[String]>::len);
        format!("Launch profile '{}' ({} targets)", self.profile, count)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        let targets: Vec<String> = ctx
            .config
            .profile_targets(&self.profile)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        if targets.is_empty() {
            result.add_error(
                format!("Profile '{}' has no targets.", self.profile),
                Some(self.step_type()),
                None,
            );
            return Ok(());
        }

        for target in &targets {
            if ctx.cancel.is_cancelled() {
                result.mark_cancelled();
                result.add_log(LogLevel::Warning, "Cancelled", Some(self.step_type()));
                return Ok(());
            }
            launch_target(target, ctx, result, self.step_type());
            if !ctx.dry_run {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
        }
        Ok(())
    }
}
