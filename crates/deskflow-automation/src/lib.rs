//! OS automation boundary for Deskflow.
//!
//! Everything the step engine does to the outside world goes through the
//! [`AutomationBackend`] trait: pointer and keyboard injection, clipboard,
//! window focus, launching targets, and file moves. [`SystemBackend`] is the
//! real implementation; [`RecordingBackend`] is a scriptable test double that
//! records every call.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub mod recording;
pub mod system;

pub use recording::{RecordedCall, RecordingBackend};
pub use system::SystemBackend;

/// Errors from automation primitives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AutomationError {
    #[error("Input injection failed: {0}")]
    Input(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Launch failed: {0}")]
    Launch(String),

    #[error("File operation failed: {0}")]
    File(String),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

impl AutomationError {
    /// Short tag describing the failure family, used in run-result errors.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationError::Input(_) => "input",
            AutomationError::Clipboard(_) => "clipboard",
            AutomationError::Launch(_) => "launch",
            AutomationError::File(_) => "file",
            AutomationError::Unsupported(_) => "unsupported",
        }
    }
}

/// Pointer buttons a click step can press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
            MouseButton::Middle => write!(f, "middle"),
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            _ => Err(format!("Unknown mouse button: {}", s)),
        }
    }
}

/// Synchronous, fallible OS automation primitives.
///
/// Implementations must be cheap to call and must not block beyond the
/// latency of the underlying OS operation; all pacing (delays between
/// keystrokes, between launches, between jiggles) belongs to the caller.
pub trait AutomationBackend: Send + Sync {
    /// Current pointer position in screen coordinates.
    fn pointer_position(&self) -> Result<(i32, i32), AutomationError>;

    /// Move the pointer by a delta.
    fn move_rel(&self, dx: i32, dy: i32) -> Result<(), AutomationError>;

    /// Move the pointer to an absolute position.
    fn move_to(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Click at an absolute position, `clicks` times, pausing `interval`
    /// between repeats.
    fn click(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        clicks: u32,
        interval: Duration,
    ) -> Result<(), AutomationError>;

    /// Type text, pausing `interval` between keystrokes (zero types the whole
    /// string at once).
    fn type_text(&self, text: &str, interval: Duration) -> Result<(), AutomationError>;

    /// Press a key combination, e.g. `["ctrl", "shift", "s"]`.
    fn hotkey(&self, keys: &[String]) -> Result<(), AutomationError>;

    /// Replace the clipboard text.
    fn set_clipboard(&self, text: &str) -> Result<(), AutomationError>;

    /// Read the clipboard text.
    fn clipboard_text(&self) -> Result<String, AutomationError>;

    /// Title of the currently focused window, if any.
    fn active_window_title(&self) -> Result<Option<String>, AutomationError>;

    /// Focus the first window whose title contains `title_substring`
    /// (case-insensitive). Returns the focused window's title, or `None` when
    /// no window matches.
    fn focus_window(&self, title_substring: &str) -> Result<Option<String>, AutomationError>;

    /// Open a URL with the system's default handler.
    fn open_url(&self, url: &str) -> Result<(), AutomationError>;

    /// Open a filesystem path with its associated application.
    fn open_path(&self, path: &Path) -> Result<(), AutomationError>;

    /// Spawn a shell command without waiting for it.
    fn spawn_command(&self, command: &str) -> Result<(), AutomationError>;

    /// Move a file; moving onto an existing directory moves into it.
    fn move_file(&self, src: &Path, dest: &Path) -> Result<(), AutomationError>;
}
