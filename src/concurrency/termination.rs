//! Cooperative cancellation.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag polled at iteration and level boundaries.
///
/// Clones observe the same flag. Setting it never interrupts a unit of work
/// already in flight; the next boundary check sees it and the computation
/// returns what it has so far.
#[derive(Clone, Debug, Default)]
pub struct TerminationFlag {
    stop: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// A flag that has not been triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination.
    pub fn terminate(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns `true` once termination was requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}
