//! Cancellation token shared by a controller and its in-flight work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tripped once when the owning controller is disposed.
///
/// Async operations check it before writing to the cache or emitting a
/// toast; anything that resolves after disposal is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
