//! CLI argument definitions for the Deskflow binary.
//!
//! Uses `clap` with derive macros. Config directory resolution priority:
//! CLI flag > DESKFLOW_CONFIG_DIR env var > platform default (~/.deskflow).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deskflow — data-driven desktop automation: actions and macros built from
/// typed steps, with preview, dry-run, and cancellation.
#[derive(Parser, Debug)]
#[command(name = "deskflow", version, about)]
pub struct CliArgs {
    /// Directory holding profiles.json, templates.json, actions.json, macros.json.
    #[arg(short = 'c', long = "config-dir")]
    pub config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with actions.
    #[command(subcommand)]
    Action(ActionCmd),
    /// Work with macros.
    #[command(subcommand)]
    Macro(MacroCmd),
}

#[derive(Subcommand, Debug)]
pub enum ActionCmd {
    /// List all actions.
    List,
    /// Print an action's step previews without running anything.
    Preview {
        id: String,
        /// Runtime input as key=value; repeatable.
        #[arg(short = 'i', long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
    },
    /// Run an action to completion (Ctrl-C cancels cooperatively).
    Run {
        id: String,
        /// Runtime input as key=value; repeatable.
        #[arg(short = 'i', long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        /// Log intent without performing any external effect.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MacroCmd {
    /// List enabled macros.
    List,
    /// Print a macro's step previews (schedule prefix included).
    Preview {
        id: String,
        #[arg(short = 'i', long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
    },
    /// Run a macro to completion (Ctrl-C cancels cooperatively).
    Run {
        id: String,
        #[arg(short = 'i', long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        #[arg(long)]
        dry_run: bool,
    },
}

impl CliArgs {
    pub fn resolve_config_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.config_dir {
            return dir.clone();
        }
        if let Ok(dir) = std::env::var("DESKFLOW_CONFIG_DIR") {
            return PathBuf::from(dir);
        }
        default_config_dir()
    }
}

fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".deskflow");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".deskflow");
    }
    PathBuf::from(".deskflow")
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}
