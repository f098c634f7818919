//! Fixed-width text and byte fields used by every binary record layout.
//!
//! Legacy clients store 8-bit text, the current client stores UTF-16 code
//! units. Both are zero padded to their field width and are not required to
//! carry a terminator when full.

use std::fmt;
use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};

/// Leading character of a language marker (`"\tJ"`, `"\tE"`, ...).
pub const LANGUAGE_MARKER_PREFIX: char = '\t';

/// Prefix `name` with a language marker unless it already carries one.
#[must_use]
pub fn add_language_marker(name: &str, marker: char) -> String {
    if has_language_marker(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push(LANGUAGE_MARKER_PREFIX);
    out.push(marker);
    out.push_str(name);
    out
}

/// Strip a leading language marker, if present.
#[must_use]
pub fn remove_language_marker(name: &str) -> &str {
    if has_language_marker(name) {
        // Both marker characters are ASCII.
        &name[2..]
    } else {
        name
    }
}

fn has_language_marker(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some(LANGUAGE_MARKER_PREFIX)
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

// ---------------------------------------------------------------------------
// 8-bit text
// ---------------------------------------------------------------------------

/// 8-bit text field of `N` bytes. Characters outside Latin-1 become `?`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedText<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedText<N> {
    /// Encode `s`, truncating to the field width.
    #[must_use]
    pub fn new(s: &str) -> Self {
        let mut out = Self::default();
        out.set(s);
        out
    }

    /// Replace the contents with `s`, truncating to the field width.
    pub fn set(&mut self, s: &str) {
        self.0 = [0; N];
        for (dst, ch) in self.0.iter_mut().zip(s.chars()) {
            *dst = u8::try_from(u32::from(ch)).unwrap_or(b'?');
        }
    }

    /// Decode up to the first zero byte.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.0.iter().take_while(|&&b| b != 0).map(|&b| char::from(b)).collect()
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }

    /// Whether the field holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.first().is_none_or(|&b| b == 0)
    }
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> BinRead for FixedText<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }
}

impl<const N: usize> BinWrite for FixedText<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UTF-16 text
// ---------------------------------------------------------------------------

/// UTF-16 text field of `N` code units, stored in the record's byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideText<const N: usize>(pub [u16; N]);

impl<const N: usize> WideText<N> {
    /// Encode `s`, truncating to the field width.
    #[must_use]
    pub fn new(s: &str) -> Self {
        let mut out = Self::default();
        out.set(s);
        out
    }

    /// Replace the contents with `s`, truncating to the field width.
    pub fn set(&mut self, s: &str) {
        self.0 = [0; N];
        for (dst, unit) in self.0.iter_mut().zip(s.encode_utf16()) {
            *dst = unit;
        }
    }

    /// Decode up to the first zero unit; unpaired surrogates become U+FFFD.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        let len = self.0.iter().position(|&u| u == 0).unwrap_or(N);
        String::from_utf16_lossy(&self.0[..len])
    }

    /// Zero every code unit.
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }

    /// Whether the field holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.first().is_none_or(|&u| u == 0)
    }
}

impl<const N: usize> Default for WideText<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for WideText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> BinRead for WideText<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut units = [0u16; N];
        for unit in &mut units {
            *unit = u16::read_options(reader, endian, ())?;
        }
        Ok(Self(units))
    }
}

impl<const N: usize> BinWrite for WideText<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<()> {
        for unit in &self.0 {
            unit.write_options(writer, endian, ())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Opaque byte blocks
// ---------------------------------------------------------------------------

/// Opaque `N`-byte section the server stores but never interprets
/// (quest flags, challenge data, key bindings, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteBlock<const N: usize>(pub [u8; N]);

impl<const N: usize> ByteBlock<N> {
    /// Zero every byte.
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }
}

impl<const N: usize> Default for ByteBlock<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for ByteBlock<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.0.iter().filter(|&&b| b != 0).count();
        write!(f, "ByteBlock<{N}>({used} non-zero)")
    }
}

impl<const N: usize> BinRead for ByteBlock<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }
}

impl<const N: usize> BinWrite for ByteBlock<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: Endian,
        (): Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}
