//! Deskflow binary — composition root.
//!
//! Ties the crates together:
//! 1. Parse CLI arguments and initialize tracing.
//! 2. Load the configuration directory.
//! 3. Build the system automation backend and the engines.
//! 4. Dispatch list/preview/run; a run gets a fresh cancel token wired to
//!    Ctrl-C, and its result is printed with an exit code matching the
//!    terminal status.

mod cli;

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;

use deskflow_automation::{AutomationBackend, SystemBackend};
use deskflow_core::ConfigStore;
use deskflow_engine::{
    ActionEngine, CancelToken, EngineError, MacroEngine, RunResult, RunStatus,
};

use cli::{ActionCmd, CliArgs, Command, MacroCmd};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let default_filter = args.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config_dir = args.resolve_config_dir();
    let config = Arc::new(ConfigStore::load_or_default(&config_dir));
    let backend: Arc<dyn AutomationBackend> = Arc::new(SystemBackend::new());

    let exit_code = match args.command {
        Command::Action(cmd) => {
            let engine = ActionEngine::new(config, backend);
            match cmd {
                ActionCmd::List => {
                    for action in engine.list_actions() {
                        println!(
                            "{:<24} {} ({} steps)",
                            action.id,
                            action.name,
                            action.steps.len()
                        );
                    }
                    0
                }
                ActionCmd::Preview { id, inputs } => {
                    match engine.preview(&id, to_map(inputs)) {
                        Ok(preview) => {
                            println!("{} — {}", preview.action_id, preview.name);
                            for line in preview.lines {
                                println!("  {}", line);
                            }
                            0
                        }
                        Err(e) => report_api_error(e),
                    }
                }
                ActionCmd::Run { id, inputs, dry_run } => {
                    let cancel = cancel_on_ctrl_c();
                    match engine.run(&id, to_map(inputs), dry_run, cancel).await {
                        Ok(result) => print_result(&result),
                        Err(e) => report_api_error(e),
                    }
                }
            }
        }
        Command::Macro(cmd) => {
            let engine = MacroEngine::new(config, backend);
            match cmd {
                MacroCmd::List => {
                    for mac in engine.list_macros() {
                        println!("{:<24} {} [{}]", mac.id, mac.name, mac.category);
                    }
                    0
                }
                MacroCmd::Preview { id, inputs } => match engine.preview(&id, to_map(inputs)) {
                    Ok(lines) => {
                        for line in lines {
                            println!("  {}", line);
                        }
                        0
                    }
                    Err(e) => report_api_error(e),
                },
                MacroCmd::Run { id, inputs, dry_run } => {
                    let cancel = cancel_on_ctrl_c();
                    match engine.run(&id, to_map(inputs), dry_run, cancel).await {
                        Ok(result) => print_result(&result),
                        Err(e) => report_api_error(e),
                    }
                }
            }
        }
    };

    std::process::exit(exit_code);
}

/// Fresh single-use token for this run, set when the user presses Ctrl-C.
/// The in-flight step finishes; the run stops at its next check point.
fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Cancellation requested; stopping at the next check point");
            handle.cancel();
        }
    });
    cancel
}

fn to_map(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    pairs.into_iter().collect()
}

fn report_api_error(e: EngineError) -> i32 {
    eprintln!("error: {}", e);
    2
}

fn print_result(result: &RunResult) -> i32 {
    for log in &result.logs {
        match &log.step_type {
            Some(step_type) => println!("[{:<7}] ({}) {}", log.level, step_type, log.message),
            None => println!("[{:<7}] {}", log.level, log.message),
        }
    }
    for error in &result.errors {
        eprintln!("error: {}", error.message);
    }
    if !result.outputs.is_empty() {
        for (key, value) in &result.outputs {
            println!("output[{}] = {}", key, value);
        }
    }
    println!("Status: {}", result.status);
    match result.status {
        RunStatus::Success => 0,
        RunStatus::Failed => 1,
        RunStatus::Cancelled => 130,
    }
}
