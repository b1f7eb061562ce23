//! Per-run execution context.

use std::collections::HashMap;
use std::sync::Arc;

use deskflow_automation::AutomationBackend;
use deskflow_core::ConfigStore;

use crate::cancel::CancelToken;

/// Read-mostly bundle handed to every step of one run.
///
/// Created fresh per run or preview call and never persisted. The context is
/// owned by a single run; only the cancel token is shared with the initiator.
pub struct ExecutionContext {
    pub config: Arc<ConfigStore>,
    pub backend: Arc<dyn AutomationBackend>,
    /// Runtime-supplied named inputs (template fields, macro placeholders).
    pub inputs: HashMap<String, String>,
    pub cancel: CancelToken,
    /// When set, steps log intent and perform no external effect.
    pub dry_run: bool,
}

impl ExecutionContext {
    pub fn new(
        config: Arc<ConfigStore>,
        backend: Arc<dyn AutomationBackend>,
        inputs: HashMap<String, String>,
        cancel: CancelToken,
        dry_run: bool,
    ) -> Self {
        Self {
            config,
            backend,
            inputs,
            cancel,
            dry_run,
        }
    }
}
