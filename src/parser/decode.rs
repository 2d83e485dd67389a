//! Field decoders
//!
//! Pure functions turning `(payload, offset)` into a typed value and/or the number of bytes the
//! value occupies. They never read out of bounds: every access goes through [`slice`], which returns
//! [`ParserError::BufferTooShort`] instead.
//!
//! Multi-byte values are little-endian, which is what ETW emits on every supported architecture.
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, FromZeroes, Unaligned};

use crate::native::etw_types::PointerSize;
use crate::native::guid::Guid;
use crate::native::time::FileTime;
use crate::parser::{ParserError, ParserResult};
use crate::schema::FieldKind;

/// Size of a GUID on the wire
pub const GUID_SIZE: usize = 16;

/// Size of a Win32 `BOOL`
pub const BOOL_SIZE: usize = 4;

/// Returns `len` bytes of `buffer`, starting at `offset`
pub fn slice(buffer: &[u8], offset: usize, len: usize) -> ParserResult<&[u8]> {
    let too_short = || ParserError::BufferTooShort {
        offset,
        len,
        available: buffer.len(),
    };

    let end = offset.checked_add(len).ok_or_else(too_short)?;
    buffer.get(offset..end).ok_or_else(too_short)
}

/// Everything from `offset` to the end of `buffer` (possibly empty)
fn remainder(buffer: &[u8], offset: usize) -> ParserResult<&[u8]> {
    slice(buffer, offset, buffer.len().saturating_sub(offset))
}

mod private {
    pub trait Sealed {}
}

/// Fixed-width numbers that can be read from a payload
pub trait Primitive: private::Sealed + Copy {
    /// Size on the wire
    const SIZE: usize;

    /// PRECONDITION: `bytes.len() == Self::SIZE`
    #[doc(hidden)]
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_primitive {
    ($T:ident) => {
        impl private::Sealed for $T {}

        impl Primitive for $T {
            const SIZE: usize = std::mem::size_of::<$T>();

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$T>()];
                raw.copy_from_slice(bytes);
                $T::from_le_bytes(raw)
            }
        }
    };
}

impl_primitive!(u8);
impl_primitive!(i8);
impl_primitive!(u16);
impl_primitive!(i16);
impl_primitive!(u32);
impl_primitive!(i32);
impl_primitive!(u64);
impl_primitive!(i64);
impl_primitive!(f32);
impl_primitive!(f64);

/// Reads a little-endian number at `offset`
pub fn read<T: Primitive>(buffer: &[u8], offset: usize) -> ParserResult<T> {
    let bytes = slice(buffer, offset, T::SIZE)?;
    Ok(T::from_le_slice(bytes))
}

/// Reads a pointer-sized integer, widened to 64 bits
pub fn read_pointer(buffer: &[u8], offset: usize, pointer_size: PointerSize) -> ParserResult<u64> {
    match pointer_size {
        PointerSize::Bits32 => read::<u32>(buffer, offset).map(u64::from),
        PointerSize::Bits64 => read::<u64>(buffer, offset),
    }
}

/// Reads a 4-byte Win32 `BOOL`
pub fn read_bool(buffer: &[u8], offset: usize) -> ParserResult<bool> {
    read::<u32>(buffer, offset).map(|b| b != 0)
}

pub fn read_filetime(buffer: &[u8], offset: usize) -> ParserResult<FileTime> {
    read::<i64>(buffer, offset).map(FileTime::from_quad)
}

/// Byte length of the NUL-terminated UTF-16 string at `offset`, terminator included
///
/// That is `2 * code_units + 2`.
pub fn utf16_string_len(buffer: &[u8], offset: usize) -> ParserResult<usize> {
    // Even an empty string needs its terminator
    let remaining = slice(buffer, offset, 2).and_then(|_| remainder(buffer, offset))?;

    remaining
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map(|units| units * 2 + 2)
        .ok_or(ParserError::UnterminatedString { offset })
}

/// Decodes the NUL-terminated UTF-16 string at `offset`
///
/// Returns the string (without its terminator) and the number of bytes it occupies.
/// Unpaired surrogates are replaced with U+FFFD.
pub fn read_utf16_string(buffer: &[u8], offset: usize) -> ParserResult<(String, usize)> {
    let len = utf16_string_len(buffer, offset)?;
    let bytes = slice(buffer, offset, len - 2)?;

    let units = bytes
        .chunks_exact(2)
        .map(|unit| u16::from_le_bytes([unit[0], unit[1]]));
    let string = widestring::decode_utf16_lossy(units).collect::<String>();

    Ok((string, len))
}

/// Byte length of the NUL-terminated 8-bit string at `offset`, terminator included
pub fn ansi_string_len(buffer: &[u8], offset: usize) -> ParserResult<usize> {
    let remaining = slice(buffer, offset, 1).and_then(|_| remainder(buffer, offset))?;

    remaining
        .iter()
        .position(|c| *c == 0)
        .map(|chars| chars + 1)
        .ok_or(ParserError::UnterminatedString { offset })
}

/// Decodes the NUL-terminated 8-bit string at `offset`
pub fn read_ansi_string(buffer: &[u8], offset: usize) -> ParserResult<(String, usize)> {
    let len = ansi_string_len(buffer, offset)?;
    let bytes = slice(buffer, offset, len - 1)?;
    let string = std::str::from_utf8(bytes)?;
    Ok((string.to_string(), len))
}

/// Decodes every byte from `offset` to the end of the buffer as a string
///
/// There is no terminator scan. Trailing NULs (padding) are trimmed.
pub fn read_trailing_ansi_string(buffer: &[u8], offset: usize) -> ParserResult<String> {
    let bytes = remainder(buffer, offset)?;
    let string = std::str::from_utf8(bytes)?;
    Ok(string.trim_end_matches(char::default()).to_string())
}

#[derive(FromZeroes, FromBytes, Unaligned)]
#[repr(C)]
struct RawGuid {
    data1: U32<LittleEndian>,
    data2: U16<LittleEndian>,
    data3: U16<LittleEndian>,
    data4: [u8; 8],
}

/// Reads the 16-byte GUID at `offset`
pub fn read_guid(buffer: &[u8], offset: usize) -> ParserResult<Guid> {
    let bytes = slice(buffer, offset, GUID_SIZE)?;
    let raw = RawGuid::read_from(bytes).ok_or(ParserError::BufferTooShort {
        offset,
        len: GUID_SIZE,
        available: buffer.len(),
    })?;

    Ok(Guid::from_values(
        raw.data1.get(),
        raw.data2.get(),
        raw.data3.get(),
        raw.data4,
    ))
}

/// Pointer-sized elements running from an offset to the end of a payload (e.g. a call stack)
///
/// Elements are decoded lazily, when iterated or accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressList<'a> {
    bytes: &'a [u8],
    pointer_size: PointerSize,
}

impl<'a> AddressList<'a> {
    /// Fails with [`ParserError::MisalignedArray`] if `bytes` is not a whole number of pointers
    pub fn new(bytes: &'a [u8], pointer_size: PointerSize) -> ParserResult<Self> {
        let element_size = pointer_size.bytes();
        if bytes.len() % element_size != 0 {
            return Err(ParserError::MisalignedArray {
                len: bytes.len(),
                element_size,
            });
        }

        Ok(AddressList {
            bytes,
            pointer_size,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.pointer_size.bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn pointer_size(&self) -> PointerSize {
        self.pointer_size
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        let offset = index.checked_mul(self.pointer_size.bytes())?;
        read_pointer(self.bytes, offset, self.pointer_size).ok()
    }

    pub fn iter(&self) -> Addresses<'a> {
        Addresses {
            chunks: self.bytes.chunks_exact(self.pointer_size.bytes()),
            pointer_size: self.pointer_size,
        }
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for AddressList<'a> {
    type Item = u64;
    type IntoIter = Addresses<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of an [`AddressList`]
#[derive(Debug, Clone)]
pub struct Addresses<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
    pointer_size: PointerSize,
}

impl Addresses<'_> {
    fn decode(&self, chunk: &[u8]) -> u64 {
        match self.pointer_size {
            PointerSize::Bits32 => u64::from(u32::from_le_slice(chunk)),
            PointerSize::Bits64 => u64::from_le_slice(chunk),
        }
    }
}

impl Iterator for Addresses<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let chunk = self.chunks.next()?;
        Some(self.decode(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl DoubleEndedIterator for Addresses<'_> {
    fn next_back(&mut self) -> Option<u64> {
        let chunk = self.chunks.next_back()?;
        Some(self.decode(chunk))
    }
}

impl ExactSizeIterator for Addresses<'_> {}

/// Reads the address list running from `offset` to the end of `buffer`
///
/// `offset == buffer.len()` is a valid, empty list.
pub fn address_list(
    buffer: &[u8],
    offset: usize,
    pointer_size: PointerSize,
) -> ParserResult<AddressList<'_>> {
    AddressList::new(remainder(buffer, offset)?, pointer_size)
}

/// Number of bytes a field of kind `kind` occupies at `offset`
///
/// Fixed-size kinds must fit in the buffer, variable-size kinds are scanned, and trailing kinds take
/// whatever is left.
pub fn field_size(
    buffer: &[u8],
    offset: usize,
    kind: FieldKind,
    pointer_size: PointerSize,
) -> ParserResult<usize> {
    if let Some(size) = kind.fixed_size(pointer_size) {
        return slice(buffer, offset, size).map(|s| s.len());
    }

    match kind {
        FieldKind::UnicodeString => utf16_string_len(buffer, offset),
        FieldKind::AnsiString => ansi_string_len(buffer, offset),
        _ => remainder(buffer, offset).map(|s| s.len()),
    }
}
