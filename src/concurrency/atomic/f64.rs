use core::sync::atomic::{AtomicU64, Ordering};

/// An `f64` stored as its bit pattern in an `AtomicU64`.
///
/// Used for per-community volume accumulators under concurrent relocation.
#[repr(transparent)]
pub struct AtomicDouble {
    inner: AtomicU64,
}

impl AtomicDouble {
    /// Creates a new atomic value.
    #[inline(always)]
    pub const fn new(value: f64) -> Self {
        Self {
            inner: AtomicU64::new(value.to_bits()),
        }
    }

    /// Loads the current value.
    #[inline(always)]
    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.inner.load(order))
    }

    /// Stores a new value.
    #[inline(always)]
    pub fn store(&self, value: f64, order: Ordering) {
        self.inner.store(value.to_bits(), order);
    }

    /// Swaps the current value, returning the previous value.
    #[inline(always)]
    pub fn swap(&self, value: f64, order: Ordering) -> f64 {
        f64::from_bits(self.inner.swap(value.to_bits(), order))
    }

    /// Adds to the current value, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, value: f64, order: Ordering) -> f64 {
        let mut current = self.inner.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .inner
                .compare_exchange_weak(current, next, order, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(observed) => current = observed,
            }
        }
    }

    /// Subtracts from the current value, returning the previous value.
    #[inline]
    pub fn fetch_sub(&self, value: f64, order: Ordering) -> f64 {
        self.fetch_add(-value, order)
    }

    /// Consumes the atomic and returns the contained value.
    #[inline]
    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.inner.into_inner())
    }
}

impl Default for AtomicDouble {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl core::fmt::Debug for AtomicDouble {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AtomicDouble")
            .field(&self.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_sub_return_previous() {
        let a = AtomicDouble::new(1.5);
        assert_eq!(a.fetch_add(2.0, Ordering::Relaxed), 1.5);
        assert_eq!(a.fetch_sub(0.5, Ordering::Relaxed), 3.5);
        assert_eq!(a.load(Ordering::Relaxed), 3.0);
        assert_eq!(a.swap(-1.0, Ordering::Relaxed), 3.0);
        assert_eq!(a.into_inner(), -1.0);
    }

    #[test]
    fn concurrent_adds_are_not_torn() {
        let a = AtomicDouble::new(0.0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        a.fetch_add(1.0, Ordering::AcqRel);
                    }
                });
            }
        });
        assert_eq!(a.load(Ordering::Acquire), 8000.0);
    }
}
