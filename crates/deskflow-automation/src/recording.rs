//! Scriptable test double for the automation boundary.
//!
//! Records every call so tests can assert exactly which side effects a run
//! produced (or, for dry runs, that there were none). Pointer positions and
//! window titles can be scripted ahead of time; launch-family calls can be
//! forced to fail to exercise error paths.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{AutomationBackend, AutomationError, MouseButton};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    MoveRel { dx: i32, dy: i32 },
    MoveTo { x: i32, y: i32 },
    Click { x: i32, y: i32, button: MouseButton, clicks: u32 },
    TypeText { text: String, interval: Duration },
    Hotkey(Vec<String>),
    SetClipboard(String),
    FocusWindow(String),
    OpenUrl(String),
    OpenPath(PathBuf),
    SpawnCommand(String),
    MoveFile { src: PathBuf, dest: PathBuf },
}

/// Recording [`AutomationBackend`]. All operations succeed unless a failure
/// is scripted.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<RecordedCall>>,
    pointer_queue: Mutex<VecDeque<(i32, i32)>>,
    pointer: Mutex<(i32, i32)>,
    windows: Mutex<Vec<String>>,
    active_window: Mutex<Option<String>>,
    clipboard: Mutex<String>,
    fail_launch: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Queue positions for successive `pointer_position` reads; once the
    /// queue drains, the last known position repeats.
    pub fn script_pointer_positions(&self, positions: &[(i32, i32)]) {
        let mut queue = self.pointer_queue.lock().unwrap();
        queue.extend(positions.iter().copied());
    }

    /// Declare which window titles exist for `focus_window` lookups.
    pub fn script_windows(&self, titles: &[&str]) {
        let mut windows = self.windows.lock().unwrap();
        *windows = titles.iter().map(|t| t.to_string()).collect();
    }

    pub fn script_active_window(&self, title: Option<&str>) {
        *self.active_window.lock().unwrap() = title.map(str::to_string);
    }

    /// Force the launch-family calls (open URL/path, spawn) to fail.
    pub fn script_launch_failure(&self, fail: bool) {
        self.fail_launch.store(fail, Ordering::Relaxed);
    }

    pub fn clipboard_contents(&self) -> String {
        self.clipboard.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn launch_guard(&self) -> Result<(), AutomationError> {
        if self.fail_launch.load(Ordering::Relaxed) {
            Err(AutomationError::Launch("scripted launch failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl AutomationBackend for RecordingBackend {
    fn pointer_position(&self) -> Result<(i32, i32), AutomationError> {
        let mut pointer = self.pointer.lock().unwrap();
        if let Some(next) = self.pointer_queue.lock().unwrap().pop_front() {
            *pointer = next;
        }
        Ok(*pointer)
    }

    fn move_rel(&self, dx: i32, dy: i32) -> Result<(), AutomationError> {
        let mut pointer = self.pointer.lock().unwrap();
        *pointer = (pointer.0 + dx, pointer.1 + dy);
        drop(pointer);
        self.record(RecordedCall::MoveRel { dx, dy });
        Ok(())
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        *self.pointer.lock().unwrap() = (x, y);
        self.record(RecordedCall::MoveTo { x, y });
        Ok(())
    }

    fn click(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        clicks: u32,
        _interval: Duration,
    ) -> Result<(), AutomationError> {
        self.record(RecordedCall::Click { x, y, button, clicks });
        Ok(())
    }

    fn type_text(&self, text: &str, interval: Duration) -> Result<(), AutomationError> {
        self.record(RecordedCall::TypeText {
            text: text.to_string(),
            interval,
        });
        Ok(())
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), AutomationError> {
        self.record(RecordedCall::Hotkey(keys.to_vec()));
        Ok(())
    }

    fn set_clipboard(&self, text: &str) -> Result<(), AutomationError> {
        *self.clipboard.lock().unwrap() = text.to_string();
        self.record(RecordedCall::SetClipboard(text.to_string()));
        Ok(())
    }

    fn clipboard_text(&self) -> Result<String, AutomationError> {
        Ok(self.clipboard.lock().unwrap().clone())
    }

    fn active_window_title(&self) -> Result<Option<String>, AutomationError> {
        Ok(self.active_window.lock().unwrap().clone())
    }

    fn focus_window(&self, title_substring: &str) -> Result<Option<String>, AutomationError> {
        self.record(RecordedCall::FocusWindow(title_substring.to_string()));
        let needle = title_substring.to_lowercase();
        let windows = self.windows.lock().unwrap();
        let found = windows
            .iter()
            .find(|title| title.to_lowercase().contains(&needle))
            .cloned();
        if let Some(title) = &found {
            *self.active_window.lock().unwrap() = Some(title.clone());
        }
        Ok(found)
    }

    fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        self.launch_guard()?;
        self.record(RecordedCall::OpenUrl(url.to_string()));
        Ok(())
    }

    fn open_path(&self, path: &Path) -> Result<(), AutomationError> {
        self.launch_guard()?;
        self.record(RecordedCall::OpenPath(path.to_path_buf()));
        Ok(())
    }

    fn spawn_command(&self, command: &str) -> Result<(), AutomationError> {
        self.launch_guard()?;
        self.record(RecordedCall::SpawnCommand(command.to_string()));
        Ok(())
    }

    fn move_file(&self, src: &Path, dest: &Path) -> Result<(), AutomationError> {
        self.record(RecordedCall::MoveFile {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        Ok(())
    }
}
