//! `PagedArray`: a fixed-length array of primitives stored in equal pages.
//!
//! Goals:
//! - addressable by `u64` regardless of platform allocation limits
//! - predictable allocation behavior (every page but the last is `PAGE_SIZE`)
//! - allocations attributed to an [`AllocationTracker`]
//!
//! Used for per-node labels (community ids, dendrogram levels, original ids).

use core::mem::size_of;
use std::sync::Arc;

use num_traits::Zero;

use crate::error::Result;
use crate::memory::AllocationTracker;

const PAGE_SHIFT: u32 = 14;
/// Elements per page.
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
const PAGE_MASK: u64 = (PAGE_SIZE as u64) - 1;

/// A zero-initialized, fixed-length paged array.
pub struct PagedArray<T: Copy + Zero> {
    pages: Vec<Box<[T]>>,
    size: u64,
    tracker: Option<Arc<AllocationTracker>>,
}

impl<T: Copy + Zero> PagedArray<T> {
    /// Allocates `size` zeroed elements, attributing the bytes to `tracker`.
    ///
    /// Fails without allocating if the tracker ceiling would be exceeded.
    pub fn new(size: u64, tracker: &Arc<AllocationTracker>) -> Result<Self> {
        let bytes = Self::memory_estimation(size);
        tracker.try_add(bytes)?;
        let mut array = Self::zeroed(size);
        array.tracker = Some(Arc::clone(tracker));
        Ok(array)
    }

    /// Allocates `size` zeroed elements without tracking.
    pub fn zeroed(size: u64) -> Self {
        let page_count = page_count(size);
        let mut pages = Vec::with_capacity(page_count);
        let mut remaining = size;
        for _ in 0..page_count {
            let len = remaining.min(PAGE_SIZE as u64) as usize;
            pages.push(vec![T::zero(); len].into_boxed_slice());
            remaining -= len as u64;
        }
        Self {
            pages,
            size,
            tracker: None,
        }
    }

    /// Bytes a `PagedArray<T>` of `size` elements occupies.
    pub fn memory_estimation(size: u64) -> usize {
        usize::try_from(size)
            .unwrap_or(usize::MAX)
            .saturating_mul(size_of::<T>())
            .saturating_add(page_count(size).saturating_mul(size_of::<Box<[T]>>()))
    }

    /// Number of elements.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` if the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of pages backing the array.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bytes held by this array.
    pub fn size_of(&self) -> usize {
        Self::memory_estimation(self.size)
    }

    /// Returns element `index`.
    ///
    /// # Panics
    /// Panics if `index >= size()`.
    #[inline]
    pub fn get(&self, index: u64) -> T {
        assert!(index < self.size, "index {index} out of bounds for size {}", self.size);
        let (page, offset) = index_split(index);
        self.pages[page][offset]
    }

    /// Sets element `index`.
    ///
    /// # Panics
    /// Panics if `index >= size()`.
    #[inline]
    pub fn set(&mut self, index: u64, value: T) {
        assert!(index < self.size, "index {index} out of bounds for size {}", self.size);
        let (page, offset) = index_split(index);
        self.pages[page][offset] = value;
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        for page in &mut self.pages {
            page.fill(value);
        }
    }

    /// Sets every element from its index.
    pub fn set_all(&mut self, mut f: impl FnMut(u64) -> T) {
        let mut base = 0u64;
        for page in &mut self.pages {
            for (i, slot) in page.iter_mut().enumerate() {
                *slot = f(base + i as u64);
            }
            base += page.len() as u64;
        }
    }

    /// Copies the first `len` elements into a new array.
    pub fn copy_of(&self, len: u64) -> Self {
        let mut out = Self::zeroed(len);
        let shared = len.min(self.size);
        out.set_all(|i| if i < shared { self.get(i) } else { T::zero() });
        out
    }

    /// Read-only access to the pages.
    pub fn pages(&self) -> &[Box<[T]>] {
        &self.pages
    }

    /// Returns an iterator over the elements in index order.
    pub fn iter(&self) -> PagedIter<'_, T> {
        PagedIter {
            array: self,
            index: 0,
        }
    }

    /// Copies the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        for page in &self.pages {
            out.extend_from_slice(page);
        }
        out
    }
}

impl<T: Copy + Zero> Drop for PagedArray<T> {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.remove(Self::memory_estimation(self.size));
        }
    }
}

impl<T: Copy + Zero> Clone for PagedArray<T> {
    fn clone(&self) -> Self {
        // Clones are untracked; only the original owns its attribution.
        Self {
            pages: self.pages.clone(),
            size: self.size,
            tracker: None,
        }
    }
}

impl<T: Copy + Zero + core::fmt::Debug> core::fmt::Debug for PagedArray<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Copy + Zero + PartialEq> PartialEq for PagedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.pages == other.pages
    }
}

impl<T: Copy + Zero> FromIterator<T> for PagedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut pages = Vec::new();
        let mut current = Vec::with_capacity(PAGE_SIZE);
        let mut size = 0u64;
        for value in iter {
            current.push(value);
            size += 1;
            if current.len() == PAGE_SIZE {
                pages.push(core::mem::replace(&mut current, Vec::with_capacity(PAGE_SIZE)).into_boxed_slice());
            }
        }
        if !current.is_empty() {
            pages.push(current.into_boxed_slice());
        }
        Self {
            pages,
            size,
            tracker: None,
        }
    }
}

/// Iterator over the values of a [`PagedArray`].
pub struct PagedIter<'a, T: Copy + Zero> {
    array: &'a PagedArray<T>,
    index: u64,
}

impl<'a, T: Copy + Zero> Iterator for PagedIter<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index >= self.array.size {
            return None;
        }
        let (page, offset) = index_split(self.index);
        self.index += 1;
        Some(self.array.pages[page][offset])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = usize::try_from(self.array.size - self.index).unwrap_or(usize::MAX);
        (rem, Some(rem))
    }
}

impl<'a, T: Copy + Zero> ExactSizeIterator for PagedIter<'a, T> {}

#[inline(always)]
fn index_split(index: u64) -> (usize, usize) {
    ((index >> PAGE_SHIFT) as usize, (index & PAGE_MASK) as usize)
}

fn page_count(size: u64) -> usize {
    usize::try_from(size.div_ceil(PAGE_SIZE as u64)).unwrap_or(usize::MAX)
}
