//! Progress reporting and cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Channel back to whoever runs an analysis.
///
/// Methods take `&self`; implementations needing state use interior
/// mutability.
pub trait Feedback {
    /// Informational message for the user
    fn push_info(&self, message: &str);

    /// Progress in percent, 0 to 100
    fn set_progress(&self, percent: f64);

    /// Polled between steps and before each feature
    fn is_canceled(&self) -> bool;
}

/// Feedback that ignores messages and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn push_info(&self, _message: &str) {}

    fn set_progress(&self, _percent: f64) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shared cancellation switch, cheap to clone and safe to trip from
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Feedback that forwards to `tracing` and honours a [`CancelFlag`]
#[derive(Debug, Clone, Default)]
pub struct LogFeedback {
    cancel: CancelFlag,
}

impl LogFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_flag(cancel: CancelFlag) -> Self {
        Self { cancel }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

impl Feedback for LogFeedback {
    fn push_info(&self, message: &str) {
        info!("{}", message);
    }

    fn set_progress(&self, percent: f64) {
        debug!(progress = percent, "scoring");
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}
