//! Byte-buffer encode / decode for fixed binary layouts.

use std::io::Cursor;

use binrw::{BinRead, BinWrite, Endian};

use crate::error::{RecordError, Result};

/// Serialize `value` in the given byte order.
///
/// # Errors
/// Returns [`RecordError::Decode`] if a field fails to serialize.
pub fn encode<T>(value: &T, endian: Endian) -> Result<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(Vec::new());
    value.write_options(&mut cursor, endian, ())?;
    Ok(cursor.into_inner())
}

/// Parse a `T` that must span the whole of `bytes`.
///
/// # Errors
/// Returns [`RecordError::Decode`] when `bytes` is too short or malformed,
/// and [`RecordError::SizeMismatch`] when bytes are left over.
pub fn decode<T>(bytes: &[u8], endian: Endian) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(bytes);
    let value = T::read_options(&mut cursor, endian, ())?;
    let consumed = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
    if consumed != bytes.len() {
        return Err(RecordError::SizeMismatch {
            expected: consumed,
            actual: bytes.len(),
        });
    }
    Ok(value)
}
