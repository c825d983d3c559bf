//! Cooperative cancellation of a batch run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, polled between images.
///
/// Cloning shares the flag. The in-flight image always finishes.
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

    /// The underlying flag, for registering signal handlers.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Set the flag on SIGINT and SIGTERM.
    #[cfg(unix)]
    pub fn register_signal_handlers(&self) -> Result<(), String> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::flag;

        for signal in [SIGINT, SIGTERM] {
            flag::register(signal, self.flag())
                .map_err(|e| format!("Failed to register signal {} handler: {}", signal, e))?;
        }
        Ok(())
    }
}
