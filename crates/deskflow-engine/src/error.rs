//! Error types for the step engine.

use deskflow_automation::AutomationError;
use thiserror::Error;

/// A step list could not be constructed from its stored specs.
///
/// Build errors happen entirely before execution starts, so one bad step
/// anywhere prevents the whole action or macro from running.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unknown step type: {0}")]
    UnknownStepType(String),

    #[error("Invalid parameter '{key}' for step '{step_type}': {detail}")]
    InvalidParam {
        step_type: &'static str,
        key: &'static str,
        detail: String,
    },
}

/// A step's `run` failed in a way the step did not record itself.
///
/// Caught at the orchestrator loop boundary and turned into a run-result
/// error; nothing escapes a run as an unhandled fault.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl StepError {
    /// Short tag describing the underlying failure family.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Automation(e) => e.kind(),
            StepError::Io(_) => "io",
        }
    }
}

/// Caller errors on the engine API surface.
///
/// `run` never returns `Build`: build failures during a run are converted
/// into a single synthetic error on the returned result instead. Previews
/// surface them directly since they produce no result to record into.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown macro: {0}")]
    UnknownMacro(String),

    #[error("Invalid steps: {0}")]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::UnknownStepType("teleport".to_string());
        assert_eq!(err.to_string(), "Unknown step type: teleport");

        let err = BuildError::InvalidParam {
            step_type: "delay",
            key: "seconds",
            detail: "expected an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'seconds' for step 'delay': expected an integer"
        );
    }

    #[test]
    fn test_step_error_kind() {
        let err: StepError = AutomationError::Clipboard("denied".to_string()).into();
        assert_eq!(err.kind(), "clipboard");

        let err: StepError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_step_error_display_is_transparent() {
        let err: StepError = AutomationError::Launch("no handler".to_string()).into();
        assert_eq!(err.to_string(), "Launch failed: no handler");
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::UnknownAction("a1".to_string()).to_string(),
            "Unknown action: a1"
        );
        assert_eq!(
            EngineError::UnknownMacro("m1".to_string()).to_string(),
            "Unknown macro: m1"
        );
    }
}
