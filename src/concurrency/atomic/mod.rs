//! Lock-free atomic primitives.
//!
//! These provide **concurrent writer** access through hardware atomics.
//! An accumulator is never observed torn: every update is a single
//! compare-and-swap on the full 64-bit word.

/// Atomic `f64` built on `AtomicU64`.
pub mod f64;

pub use self::f64::AtomicDouble;
