//! [`CancelToken`] – cooperative cancellation signal.
//!
//! One token is created per request and cloned into every place that may
//! block or loop: the acquisition loop, the sensor driver, and each
//! reduction worker.  Any holder can fire it; every holder observes it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use odist_types::VisionError;

/// Shared cancellation flag.  Cloning yields a handle to the same flag.
///
/// # Example
///
/// ```
/// use odist_hal::CancelToken;
///
/// let token = CancelToken::new();
/// let worker_handle = token.clone();
/// assert!(worker_handle.check().is_ok());
///
/// token.cancel();
/// assert!(worker_handle.is_cancelled());
/// assert!(worker_handle.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.  Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`][Self::cancel] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(VisionError::Cancelled)` once the signal has fired.
    pub fn check(&self) -> Result<(), VisionError> {
        if self.is_cancelled() {
            Err(VisionError::Cancelled)
        } else {
            Ok(())
        }
    }
}
