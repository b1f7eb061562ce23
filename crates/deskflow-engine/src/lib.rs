//! Data-driven step-execution engine for desktop automation.
//!
//! Typed steps (launch, click, type, wait, render a template, move files,
//! focus a window, jiggle the pointer) run strictly in order against a shared
//! per-run context, accumulating logs, errors, and named outputs into a
//! [`RunResult`] with a terminal status. Runs support a non-destructive
//! preview/dry-run mode and cooperative cancellation via [`CancelToken`].
//!
//! A run blocks its caller (`.await`) for its full duration, sleeps included;
//! hosts are expected to spawn runs on a background task and keep at most one
//! run per shared resource in flight.

pub mod cancel;
pub mod context;
pub mod engine;
pub mod error;
pub mod macro_engine;
pub mod result;
pub mod step;

pub use cancel::CancelToken;
pub use context::ExecutionContext;
pub use engine::{ActionEngine, ActionPreview};
pub use error::{BuildError, EngineError, StepError};
pub use macro_engine::MacroEngine;
pub use result::{LogEntry, LogLevel, RunError, RunResult, RunStatus};
pub use step::{step_from_spec, Step};
