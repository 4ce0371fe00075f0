//! Variable-length unsigned integers and delta-encoded adjacency records.
//!
//! Seven payload bits per byte, least significant group first; the high bit
//! marks that another byte follows. A `u64` takes between 1 and 10 bytes.

use crate::error::{Error, Result};

/// Longest encoding of a `u64`.
pub const MAX_ENCODED_LEN: usize = 10;

/// Number of bytes `value` occupies once encoded.
#[inline]
pub const fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Appends the encoding of `value` to `out`.
#[inline]
pub fn encode(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decodes one value starting at `*pos`, advancing `*pos` past it.
///
/// # Panics
/// Panics if the buffer ends inside a value. Buffers are produced by
/// [`encode`] only, so a truncated value is a broken store.
#[inline]
pub fn decode(bytes: &[u8], pos: &mut usize) -> u64 {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = bytes[*pos];
        *pos += 1;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return value;
        }
        shift += 7;
        debug_assert!(shift < 64 + 7, "varint longer than {MAX_ENCODED_LEN} bytes");
    }
}

/// Appends the record for `node`: its degree followed by delta-encoded targets.
///
/// `targets` must be sorted ascending. An out-of-order target would need a
/// negative delta, which the format cannot express; that is reported as
/// [`Error::Encoding`] and means the producing stage skipped its sort.
pub fn encode_record(node: u64, targets: &[u64], out: &mut Vec<u8>) -> Result<usize> {
    let start = out.len();
    encode(targets.len() as u64, out);
    let mut previous = 0u64;
    for &target in targets {
        let Some(delta) = target.checked_sub(previous) else {
            out.truncate(start);
            return Err(Error::Encoding {
                node,
                previous,
                target,
            });
        };
        encode(delta, out);
        previous = target;
    }
    Ok(out.len() - start)
}

/// Byte length of the record [`encode_record`] would write.
pub fn record_len(targets: &[u64]) -> usize {
    let mut previous = 0u64;
    let mut len = encoded_len(targets.len() as u64);
    for &target in targets {
        len += encoded_len(target.wrapping_sub(previous));
        previous = target;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_len_boundaries() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(127), 1);
        assert_eq!(encoded_len(128), 2);
        assert_eq!(encoded_len(16_383), 2);
        assert_eq!(encoded_len(16_384), 3);
        assert_eq!(encoded_len(u64::MAX), MAX_ENCODED_LEN);
    }

    #[test]
    fn encode_decode_edge_values() {
        let values = [0, 1, 127, 128, 300, 1 << 35, u64::MAX];
        let mut buf = Vec::new();
        for &v in &values {
            encode(v, &mut buf);
        }
        let mut pos = 0;
        for &v in &values {
            assert_eq!(decode(&buf, &mut pos), v);
        }
        assert_eq!(pos, buf.len());
        assert_eq!(buf.len(), values.iter().map(|&v| encoded_len(v)).sum::<usize>());
    }

    #[test]
    fn record_stores_degree_then_deltas() {
        let mut buf = Vec::new();
        let written = encode_record(3, &[2, 5, 300], &mut buf).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(written, record_len(&[2, 5, 300]));
        // degree 3, then 2, 3, 295 (two bytes)
        assert_eq!(buf[..3], [3, 2, 3]);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn unsorted_record_is_an_encoding_error() {
        let mut buf = vec![9];
        let err = encode_record(7, &[4, 2], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Encoding {
                node: 7,
                previous: 4,
                target: 2
            }
        ));
        assert_eq!(buf, vec![9], "partial record must be rolled back");
    }
}
