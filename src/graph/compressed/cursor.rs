//! Forward-only decoding of one adjacency record.

use super::varint;

/// Decodes the targets of one node lazily, in ascending order.
///
/// Each step decodes one delta and adds it to a running sum, so visiting a
/// node costs O(degree). There is no way to seek into the middle of a record.
#[derive(Clone, Debug)]
pub struct AdjacencyCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    remaining: u64,
    current: u64,
}

impl<'a> AdjacencyCursor<'a> {
    /// Opens the record starting at byte `offset`.
    #[inline]
    pub fn new(bytes: &'a [u8], offset: u64) -> Self {
        let mut pos = offset as usize;
        let remaining = varint::decode(bytes, &mut pos);
        Self {
            bytes,
            pos,
            remaining,
            current: 0,
        }
    }

    /// An exhausted cursor.
    pub fn empty() -> Self {
        Self {
            bytes: &[],
            pos: 0,
            remaining: 0,
            current: 0,
        }
    }

    /// Targets not yet decoded.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns `true` while another target can be decoded.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }
}

impl<'a> Iterator for AdjacencyCursor<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.current += varint::decode(self.bytes, &mut self.pos);
        Some(self.current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (rem, Some(rem))
    }
}

impl<'a> ExactSizeIterator for AdjacencyCursor<'a> {}
