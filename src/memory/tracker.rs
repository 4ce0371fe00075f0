//! Shared allocation tracker.

use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use crate::error::{Error, Result};

/// Counts bytes held by graph structures, optionally under a ceiling.
///
/// Callers never read-modify-write the counters directly; every change goes
/// through [`try_add`](Self::try_add) / [`remove`](Self::remove). Share it
/// through an `Arc`.
pub struct AllocationTracker {
    enabled: bool,
    limit: Option<usize>,
    in_use: CachePadded<AtomicUsize>,
    peak: CachePadded<AtomicUsize>,
}

impl AllocationTracker {
    /// A tracker that counts bytes without a ceiling.
    pub const fn new() -> Self {
        Self {
            enabled: true,
            limit: None,
            in_use: CachePadded::new(AtomicUsize::new(0)),
            peak: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// A tracker that rejects allocations pushing usage past `limit` bytes.
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            enabled: true,
            limit: Some(limit),
            in_use: CachePadded::new(AtomicUsize::new(0)),
            peak: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// A tracker that records nothing and never fails.
    pub const fn empty() -> Self {
        Self {
            enabled: false,
            limit: None,
            in_use: CachePadded::new(AtomicUsize::new(0)),
            peak: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `true` unless this is an [`empty`](Self::empty) tracker.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The configured ceiling, if any.
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently attributed.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Highest value [`in_use`](Self::in_use) has reached.
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Bytes still available under the ceiling (`usize::MAX` without one).
    pub fn available(&self) -> usize {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.in_use()),
            None => usize::MAX,
        }
    }

    /// Checks whether `bytes` more would fit, without recording anything.
    pub fn check(&self, bytes: usize) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let available = self.available();
        if bytes > available {
            return Err(Error::MemoryLimitExceeded {
                requested: bytes,
                available,
            });
        }
        Ok(())
    }

    /// Attributes `bytes`, failing if the ceiling would be crossed.
    pub fn try_add(&self, bytes: usize) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut current = self.in_use.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(bytes);
            if let Some(limit) = self.limit {
                if next > limit {
                    return Err(Error::MemoryLimitExceeded {
                        requested: bytes,
                        available: limit.saturating_sub(current),
                    });
                }
            }
            match self
                .in_use
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    self.peak.fetch_max(next, Ordering::Relaxed);
                    return Ok(());
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Releases `bytes` previously attributed.
    pub fn remove(&self, bytes: usize) {
        if !self.enabled {
            return;
        }
        let _ = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |v| Some(v.saturating_sub(bytes)));
    }
}

impl Default for AllocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AllocationTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AllocationTracker")
            .field("enabled", &self.enabled)
            .field("limit", &self.limit)
            .field("in_use", &self.in_use())
            .field("peak", &self.peak())
            .finish()
    }
}
