//! Collections sized for graphs beyond single-allocation comfort.
//!
//! - `paged_array`: fixed-size primitive arrays split into equal pages and
//!   addressed by a 64-bit logical index

pub mod paged_array;

pub use paged_array::{PagedArray, PagedIter};
