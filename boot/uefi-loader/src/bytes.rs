//! Bounds-checked reads out of file buffers.

use core::mem;
use core::ptr;

use crate::error::LoadError;

/// Plain on-disk header layouts that may be copied out of arbitrary bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and made only of integers and integer
/// arrays, so every bit pattern is a valid value.
pub unsafe trait RawHeader: Copy {}

/// Checks that `len` bytes starting at `offset` lie inside `bytes` and
/// returns the exclusive end offset.
pub fn checked_end(
    bytes: &[u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<usize, LoadError> {
    let end = offset.checked_add(len).ok_or(LoadError::Corrupt("offset overflows"))?;
    if end > bytes.len() {
        return Err(LoadError::Truncated {
            what,
            needed: end,
            available: bytes.len(),
        });
    }
    Ok(end)
}

/// Returns the sub-slice `offset..offset + len`.
pub fn slice_at<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], LoadError> {
    let end = checked_end(bytes, offset, len, what)?;
    Ok(&bytes[offset..end])
}

/// Copies exactly `size_of::<T>()` bytes at `offset` into a `T`.
pub fn read_struct<T: RawHeader>(
    bytes: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<T, LoadError> {
    checked_end(bytes, offset, mem::size_of::<T>(), what)?;
    // SAFETY: the range was checked above and `T: RawHeader` accepts any bits.
    Ok(unsafe { ptr::read_unaligned(bytes.as_ptr().add(offset).cast::<T>()) })
}

/// Decodes a little-endian 64-bit value at `offset`.
pub fn read_u64_le(bytes: &[u8], offset: usize, what: &'static str) -> Result<u64, LoadError> {
    let raw = slice_at(bytes, offset, 8, what)?;
    let mut value = [0u8; 8];
    value.copy_from_slice(raw);
    Ok(u64::from_le_bytes(value))
}
