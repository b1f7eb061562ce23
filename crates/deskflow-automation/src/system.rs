//! Real automation backend: enigo for input, arboard for the clipboard,
//! `std::process`/`std::fs` for launching and file moves.

use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::{AutomationBackend, AutomationError, MouseButton};

/// Production [`AutomationBackend`].
///
/// The enigo connection is created lazily on the first input call, so
/// constructing the backend never fails and read-only commands (list,
/// preview) work on headless machines.
pub struct SystemBackend {
    input: Mutex<Option<Enigo>>,
}

impl SystemBackend {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(None),
        }
    }

    fn with_input<T>(
        &self,
        f: impl FnOnce(&mut Enigo) -> Result<T, enigo::InputError>,
    ) -> Result<T, AutomationError> {
        let mut guard = self
            .input
            .lock()
            .map_err(|_| AutomationError::Input("input connection poisoned".to_string()))?;
        if guard.is_none() {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| AutomationError::Input(e.to_string()))?;
            *guard = Some(enigo);
        }
        let Some(enigo) = guard.as_mut() else {
            return Err(AutomationError::Input("input connection unavailable".to_string()));
        };
        f(enigo).map_err(|e| AutomationError::Input(e.to_string()))
    }
}

impl Default for SystemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationBackend for SystemBackend {
    fn pointer_position(&self) -> Result<(i32, i32), AutomationError> {
        self.with_input(|enigo| enigo.location())
    }

    fn move_rel(&self, dx: i32, dy: i32) -> Result<(), AutomationError> {
        self.with_input(|enigo| enigo.move_mouse(dx, dy, Coordinate::Rel))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.with_input(|enigo| enigo.move_mouse(x, y, Coordinate::Abs))
    }

    fn click(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        clicks: u32,
        interval: Duration,
    ) -> Result<(), AutomationError> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        self.with_input(|enigo| {
            enigo.move_mouse(x, y, Coordinate::Abs)?;
            for n in 0..clicks.max(1) {
                if n > 0 && !interval.is_zero() {
                    std::thread::sleep(interval);
                }
                enigo.button(button, Direction::Click)?;
            }
            Ok(())
        })
    }

    fn type_text(&self, text: &str, interval: Duration) -> Result<(), AutomationError> {
        self.with_input(|enigo| {
            if interval.is_zero() {
                return enigo.text(text);
            }
            for c in text.chars() {
                enigo.key(Key::Unicode(c), Direction::Click)?;
                std::thread::sleep(interval);
            }
            Ok(())
        })
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), AutomationError> {
        let mut parsed = Vec::with_capacity(keys.len());
        for name in keys {
            parsed.push(parse_key(name)?);
        }
        let Some((last, modifiers)) = parsed.split_last() else {
            return Err(AutomationError::Input("empty hotkey".to_string()));
        };
        self.with_input(|enigo| {
            for key in modifiers {
                enigo.key(*key, Direction::Press)?;
            }
            let result = enigo.key(*last, Direction::Click);
            for key in modifiers.iter().rev() {
                enigo.key(*key, Direction::Release)?;
            }
            result
        })
    }

    fn set_clipboard(&self, text: &str) -> Result<(), AutomationError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| AutomationError::Clipboard(e.to_string()))
    }

    fn clipboard_text(&self) -> Result<String, AutomationError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
        clipboard
            .get_text()
            .map_err(|e| AutomationError::Clipboard(e.to_string()))
    }

    fn active_window_title(&self) -> Result<Option<String>, AutomationError> {
        Err(AutomationError::Unsupported("window enumeration"))
    }

    fn focus_window(&self, _title_substring: &str) -> Result<Option<String>, AutomationError> {
        Err(AutomationError::Unsupported("window activation"))
    }

    fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        open_with_default_handler(url)
            .map(|_| ())
            .map_err(|e| AutomationError::Launch(e.to_string()))
    }

    fn open_path(&self, path: &Path) -> Result<(), AutomationError> {
        open_with_default_handler(&path.display().to_string())
            .map(|_| ())
            .map_err(|e| AutomationError::Launch(e.to_string()))
    }

    fn spawn_command(&self, command: &str) -> Result<(), AutomationError> {
        shell_command(command)
            .spawn()
            .map(|_| ())
            .map_err(|e| AutomationError::Launch(e.to_string()))
    }

    fn move_file(&self, src: &Path, dest: &Path) -> Result<(), AutomationError> {
        let dest = resolve_move_dest(src, dest);
        if let Err(rename_err) = std::fs::rename(src, &dest) {
            // Cross-device moves fail rename; fall back to copy + remove for
            // plain files.
            if src.is_file() {
                std::fs::copy(src, &dest).map_err(|e| AutomationError::File(e.to_string()))?;
                std::fs::remove_file(src).map_err(|e| AutomationError::File(e.to_string()))?;
            } else {
                return Err(AutomationError::File(rename_err.to_string()));
            }
        }
        Ok(())
    }
}

/// Moving onto an existing directory means moving into it.
fn resolve_move_dest(src: &Path, dest: &Path) -> std::path::PathBuf {
    if dest.is_dir() {
        if let Some(name) = src.file_name() {
            return dest.join(name);
        }
    }
    dest.to_path_buf()
}

fn open_with_default_handler(target: &str) -> std::io::Result<std::process::Child> {
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").args(["/C", "start", "", target]).spawn()
    }
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(target).spawn()
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open").arg(target).spawn()
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

fn parse_key(name: &str) -> Result<Key, AutomationError> {
    let lowered = name.to_lowercase();
    let key = match lowered.as_str() {
        "ctrl" | "control" => Key::Control,
        "shift" => Key::Shift,
        "alt" => Key::Alt,
        "win" | "cmd" | "super" | "meta" => Key::Meta,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => {
            let mut chars = lowered.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => {
                    return Err(AutomationError::Input(format!("Unknown key: {}", name)));
                }
            }
        }
    };
    Ok(key)
}
