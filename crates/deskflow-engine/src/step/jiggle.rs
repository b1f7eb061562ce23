//! Pointer-jiggle step: keeps a machine from idle-locking by synthesizing
//! small pointer movements whenever no activity happened for a while.

use std::time::Duration;

use async_trait::async_trait;
use deskflow_automation::{AutomationBackend, AutomationError};
use rand::Rng;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

const POLL_TICK: Duration = Duration::from_millis(500);

/// Small-motion recipe used when the idle timer elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JigglePattern {
    Natural,
    Invisible,
    #[default]
    Subtle,
    Circle,
    Random,
}

impl JigglePattern {
    /// Unknown names fall back to the subtle recipe.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "natural" => JigglePattern::Natural,
            "invisible" => JigglePattern::Invisible,
            "circle" => JigglePattern::Circle,
            "random" => JigglePattern::Random,
            _ => JigglePattern::Subtle,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JigglePattern::Natural => "natural",
            JigglePattern::Invisible => "invisible",
            JigglePattern::Subtle => "subtle",
            JigglePattern::Circle => "circle",
            JigglePattern::Random => "random",
        }
    }
}

/// Poll for `duration` seconds; when `interval` seconds pass without
/// activity, synthesize one small movement. With `track_mouse`, real pointer
/// movement counts as activity and resets the idle timer instead.
///
/// Never records an error; logs a final count of synthesized jiggles.
#[derive(Debug)]
pub struct JiggleStep {
    duration: u64,
    pattern: JigglePattern,
    interval: u64,
    track_mouse: bool,
}

impl JiggleStep {
    pub fn new(duration: u64, pattern: JigglePattern, interval: u64, track_mouse: bool) -> Self {
        Self {
            duration,
            pattern,
            interval,
            track_mouse,
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(
            p.unsigned("duration", 60)?,
            JigglePattern::parse(&p.string("pattern", "natural")?),
            p.unsigned("interval", 30)?,
            p.boolean("track_mouse", true)?,
        ))
    }

    fn jiggle_once(&self, backend: &dyn AutomationBackend) -> Result<(), AutomationError> {
        match self.pattern {
            JigglePattern::Natural => {
                let dx = if rand::rng().random_bool(0.5) { 1 } else { -1 };
                backend.move_rel(dx, 0)?;
                backend.move_rel(-dx, 0)
            }
            JigglePattern::Invisible => backend.move_rel(0, 0),
            JigglePattern::Subtle => {
                backend.move_rel(1, 0)?;
                backend.move_rel(-1, 0)
            }
            JigglePattern::Circle => {
                let (cx, cy) = backend.pointer_position()?;
                for i in 0..8 {
                    let angle = (f64::from(i) / 8.0) * std::f64::consts::TAU;
                    backend.move_rel(
                        (2.0 * angle.cos()).round() as i32,
                        (2.0 * angle.sin()).round() as i32,
                    )?;
                }
                backend.move_to(cx, cy)
            }
            JigglePattern::Random => {
                let mut rng = rand::rng();
                let dx = rng.random_range(-3..=3);
                let dy = rng.random_range(-3..=3);
                backend.move_rel(dx, dy)?;
                backend.move_rel(-dx, -dy)
            }
        }
    }
}

#[async_trait]
impl Step for JiggleStep {
    fn step_type(&self) -> &'static str {
        "jiggle"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!(
            "Jiggle mouse for {}s ({})",
            self.duration,
            self.pattern.name()
        )
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(LogLevel::Info, "Dry-run: skipping jiggle", Some(self.step_type()));
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.duration);
        let mut jiggle_count: u64 = 0;
        let mut last_pos = ctx.backend.pointer_position().unwrap_or((0, 0));
        let mut last_activity = tokio::time::Instant::now();

        result.add_log(
            LogLevel::Info,
            format!(
                "Starting jiggle for {}s (pattern: {})",
                self.duration,
                self.pattern.name()
            ),
            Some(self.step_type()),
        );

        while tokio::time::Instant::now() < deadline {
            if ctx.cancel.is_cancelled() {
                result.mark_cancelled();
                result.add_log(LogLevel::Warning, "Jiggle cancelled", Some(self.step_type()));
                return Ok(());
            }

            let current_pos = ctx.backend.pointer_position().unwrap_or(last_pos);
            let now = tokio::time::Instant::now();

            // Real pointer movement counts as activity and resets the timer.
            if self.track_mouse && current_pos != last_pos {
                last_activity = now;
                jiggle_count += 1;
                last_pos = current_pos;
            }

            if now.duration_since(last_activity) >= Duration::from_secs(self.interval) {
                match self.jiggle_once(ctx.backend.as_ref()) {
                    Ok(()) => {
                        jiggle_count += 1;
                        last_activity = now;
                        last_pos = ctx.backend.pointer_position().unwrap_or(last_pos);
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Jiggle movement failed");
                    }
                }
            }

            tokio::time::sleep(POLL_TICK).await;
        }

        result.add_log(
            LogLevel::Info,
            format!("Jiggled {} times over {}s", jiggle_count, self.duration),
            Some(self.step_type()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RunStatus;
    use crate::testutil::recording_ctx;
    use deskflow_automation::RecordedCall;

    #[test]
    fn test_pattern_parse_known_and_fallback() {
        assert_eq!(JigglePattern::parse("natural"), JigglePattern::Natural);
        assert_eq!(JigglePattern::parse("Circle"), JigglePattern::Circle);
        assert_eq!(JigglePattern::parse("invisible"), JigglePattern::Invisible);
        assert_eq!(JigglePattern::parse("random"), JigglePattern::Random);
        assert_eq!(JigglePattern::parse("subtle"), JigglePattern::Subtle);
        assert_eq!(JigglePattern::parse("wiggle"), JigglePattern::Subtle);
    }

    #[test]
    fn test_preview_shows_duration_and_pattern() {
        let (ctx, _) = recording_ctx(true);
        let step = JiggleStep::new(60, JigglePattern::Natural, 30, true);
        assert_eq!(step.preview(&ctx), "Jiggle mouse for 60s (natural)");
    }

    #[tokio::test]
    async fn test_dry_run_skips() {
        let (ctx, backend) = recording_ctx(true);
        let mut result = RunResult::new();
        JiggleStep::new(60, JigglePattern::Subtle, 30, true)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 0);
        assert_eq!(result.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_duration_logs_zero_jiggles() {
        let (ctx, backend) = recording_ctx(false);
        let mut result = RunResult::new();
        JiggleStep::new(0, JigglePattern::Subtle, 30, true)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(result.logs.last().unwrap().message, "Jiggled 0 times over 0s");
    }

    #[tokio::test]
    async fn test_cancelled_on_first_poll() {
        let (ctx, backend) = recording_ctx(false);
        ctx.cancel.cancel();
        let mut result = RunResult::new();
        JiggleStep::new(60, JigglePattern::Subtle, 30, true)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Cancelled);
        assert_eq!(backend.call_count(), 0);
        assert_eq!(result.logs.last().unwrap().message, "Jiggle cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_pointer_gets_jiggled() {
        let (ctx, backend) = recording_ctx(false);
        let mut result = RunResult::new();
        JiggleStep::new(1, JigglePattern::Subtle, 0, false)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        let moves = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RecordedCall::MoveRel { .. }))
            .count();
        assert!(moves > 0, "expected synthesized movement");
        assert!(result.logs.last().unwrap().message.starts_with("Jiggled "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracked_user_movement_suppresses_jiggle() {
        let (ctx, backend) = recording_ctx(false);
        backend.script_pointer_positions(&[(0, 0), (5, 5), (10, 10), (15, 15)]);
        let mut result = RunResult::new();
        JiggleStep::new(1, JigglePattern::Subtle, 30, true)
            .run(&ctx, &mut result)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        // User activity resets the idle timer; no synthetic movement happens.
        assert_eq!(backend.call_count(), 0);
        let last = result.logs.last().unwrap();
        assert!(last.message.starts_with("Jiggled "));
        assert!(!last.message.starts_with("Jiggled 0"));
    }
}
