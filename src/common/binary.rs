//! Bounds-checked little-endian field readers.
//!
//! Every fixed-width field in a compound file (header, directory records,
//! property sets) is read through these helpers instead of reinterpreting
//! memory. Offsets frequently come straight from the file, so all range
//! arithmetic is checked.

use thiserror::Error;
use zerocopy::{FromBytes, I16, I32, LE, U16, U32, U64};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    /// Not enough data to read the requested field
    #[error("insufficient data at offset {offset}: need {needed} bytes, {available} available")]
    InsufficientData {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `len` bytes starting at `offset`.
///
/// # Examples
///
/// ```
/// use olecf::common::binary::read_bytes;
/// let data = [1u8, 2, 3, 4];
/// assert_eq!(read_bytes(&data, 1, 2).unwrap(), &[2, 3]);
/// assert!(read_bytes(&data, 3, 2).is_err());
/// ```
#[inline]
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(BinaryError::InsufficientData {
            offset,
            needed: len,
            available: data.len().saturating_sub(offset),
        })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use olecf::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(U16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .unwrap_or_default())
}

/// Read a little-endian i16 from a byte slice at the given offset.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(I16::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .unwrap_or_default())
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use olecf::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .unwrap_or_default())
}

/// Read a little-endian i32 from a byte slice at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(I32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .unwrap_or_default())
}

/// Read a little-endian u64 from a byte slice at the given offset.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> BinaryResult<u64> {
    let bytes = read_bytes(data, offset, 8)?;
    Ok(U64::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .unwrap_or_default())
}

/// Decode a sequence of little-endian u32 values, ignoring a trailing partial word.
pub fn read_u32_array(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|chunk| {
            U32::<LE>::read_from_bytes(chunk)
                .map(|v| v.get())
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert!(read_u16_le(&data, 0).is_ok_and(|v| v == 0x1234));
        assert!(read_u16_le(&data, 2).is_ok_and(|v| v == 0x5678));
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert!(read_u32_le(&data, 0).is_ok_and(|v| v == 0x12345678));
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_read_signed() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(read_i16_le(&data, 0), Ok(-1));
        assert_eq!(read_i32_le(&data, 0), Ok(-1));
    }

    #[test]
    fn test_read_u64_le() {
        let data = [0x01, 0, 0, 0, 0x02, 0, 0, 0];
        assert_eq!(read_u64_le(&data, 0), Ok(0x0000_0002_0000_0001));
        assert!(read_u64_le(&data, 1).is_err());
    }

    #[test]
    fn test_offset_overflow_is_an_error() {
        let data = [0u8; 8];
        assert_eq!(
            read_u32_le(&data, usize::MAX - 1),
            Err(BinaryError::InsufficientData {
                offset: usize::MAX - 1,
                needed: 4,
                available: 0,
            })
        );
    }

    #[test]
    fn test_read_u32_array_drops_partial_word() {
        let data = [1, 0, 0, 0, 2, 0, 0, 0, 9];
        assert_eq!(read_u32_array(&data), vec![1, 2]);
    }
}
