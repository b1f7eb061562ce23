//! Cooperative cancellation flag shared between a run and its initiator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set-once "please stop" flag, observed cooperatively.
///
/// Cloning shares the underlying flag. Setting it does not interrupt an
/// in-progress step; it takes effect at the next check point (before each
/// step, and inside long-sleeping steps at bounded intervals). A token is
/// single-use: it is never reset, and each run gets a fresh one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
