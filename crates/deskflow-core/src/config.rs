//! Configuration data model and JSON-backed store.
//!
//! Deskflow keeps four configuration files in one directory:
//! `profiles.json`, `templates.json`, `actions.json`, and `macros.json`.
//! The engine only ever reads this data; editing tooling owns the writes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{CoreError, Result};

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "general".to_string()
}

/// One stored step: a registry type key plus its parameter bag.
///
/// Parameters are free-form JSON; coercion into concrete step fields happens
/// when a live step is constructed from the spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSpec {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl StepSpec {
    pub fn new(step_type: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            step_type: step_type.into(),
            params,
        }
    }
}

/// A named, ordered list of steps with no templating or scheduling affordances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Informational safety classification for macros. Has no execution effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroSafety {
    #[default]
    Safe,
    Confirm,
    Danger,
}

/// Like an [`ActionDef`], plus input-placeholder substitution and optional
/// schedule metadata (wait-until time, start delay, app to focus first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub safety: MacroSafety,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    /// Wall-clock "HH:MM" to wait for before the macro's own steps.
    #[serde(default)]
    pub schedule_time: Option<String>,
    /// Fixed delay in seconds before the macro's own steps.
    #[serde(default)]
    pub schedule_delay: Option<u64>,
    /// Window-title substring to focus before the macro's own steps.
    #[serde(default)]
    pub app_title: Option<String>,
}

/// Input field kinds a template can ask the host to collect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Multiline,
    Choice,
}

/// One user-supplied input field in a template's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// A named text template with its input-field schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDef {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    pub body: String,
    #[serde(default)]
    pub hotkey: Option<String>,
}

/// `profiles.json`: named, ordered lists of launch targets (URLs or paths).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesFile {
    #[serde(default = "default_version")]
    pub config_version: u32,
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<String>>,
}

/// `templates.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesFile {
    #[serde(default = "default_version")]
    pub config_version: u32,
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
}

/// `actions.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsFile {
    #[serde(default = "default_version")]
    pub config_version: u32,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

/// `macros.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacrosFile {
    #[serde(default = "default_version")]
    pub config_version: u32,
    #[serde(default)]
    pub macros: Vec<MacroDef>,
}

impl Default for ProfilesFile {
    fn default() -> Self {
        Self {
            config_version: 1,
            profiles: BTreeMap::new(),
        }
    }
}

impl Default for TemplatesFile {
    fn default() -> Self {
        Self {
            config_version: 1,
            templates: Vec::new(),
        }
    }
}

impl Default for ActionsFile {
    fn default() -> Self {
        Self {
            config_version: 1,
            actions: Vec::new(),
        }
    }
}

impl Default for MacrosFile {
    fn default() -> Self {
        Self {
            config_version: 1,
            macros: Vec::new(),
        }
    }
}

/// All configuration the engine reads, loaded from one directory.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    pub profiles: ProfilesFile,
    pub templates: TemplatesFile,
    pub actions: ActionsFile,
    pub macros: MacrosFile,
}

impl ConfigStore {
    /// Load all four configuration files from `dir`.
    ///
    /// A missing file is treated as its empty default; a file that exists but
    /// fails to parse is an error.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let store = Self {
            profiles: load_file(&dir.join("profiles.json"))?,
            templates: load_file(&dir.join("templates.json"))?,
            actions: load_file(&dir.join("actions.json"))?,
            macros: load_file(&dir.join("macros.json"))?,
        };
        info!(
            path = %dir.display(),
            actions = store.actions.actions.len(),
            macros = store.macros.macros.len(),
            "Configuration loaded"
        );
        Ok(store)
    }

    /// Load configuration from `dir`, falling back to empty defaults if any
    /// file cannot be read or parsed.
    pub fn load_or_default(dir: &Path) -> Self {
        match Self::load_dir(dir) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    dir.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save all four configuration files into `dir`, creating it if needed.
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        save_file(&dir.join("profiles.json"), &self.profiles)?;
        save_file(&dir.join("templates.json"), &self.templates)?;
        save_file(&dir.join("actions.json"), &self.actions)?;
        save_file(&dir.join("macros.json"), &self.macros)?;
        Ok(())
    }

    /// Look up an action definition by its stable id.
    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.actions.iter().find(|a| a.id == id)
    }

    /// Look up a macro definition by its stable id (including disabled ones).
    pub fn macro_def(&self, id: &str) -> Option<&MacroDef> {
        self.macros.macros.iter().find(|m| m.id == id)
    }

    /// Look up a template definition by its stable id.
    pub fn template(&self, id: &str) -> Option<&TemplateDef> {
        self.templates.templates.iter().find(|t| t.id == id)
    }

    /// The ordered launch targets of a named profile, if it exists.
    pub fn profile_targets(&self, name: &str) -> Option<&[String]> {
        self.profiles.profiles.get(name).map(Vec::as_slice)
    }
}

fn load_file<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
}

fn save_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}
