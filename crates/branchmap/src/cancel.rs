//! Cooperative cancellation for long scans.
//!
//! Import handlers check the token between file operations, never in the
//! middle of matching a file's text.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a token handed to a scan can be
/// cancelled from a signal handler or another task.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Return `Err(Error::Cancelled)` once cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if [`cancel`](Self::cancel) was called on
    /// this token or any of its clones.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
