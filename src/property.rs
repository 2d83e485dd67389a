//! ETW Event Property information
//!
//! The `property` module exposes the located bytes of a field ([`PropertySlice`]) and the dynamically
//! typed [`Value`] they decode to, for callers that do not know the type of a field in advance
//! (generic dumpers, serializers...).
use crate::native::etw_types::PointerSize;
use crate::native::guid::Guid;
use crate::native::time::FileTime;
use crate::parser::decode::{self, AddressList};
use crate::parser::{ParserResult, Pointer};
use crate::schema::{Field, FieldKind};

/// Offset and length of a field within a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSpan {
    pub offset: usize,
    pub len: usize,
}

impl FieldSpan {
    /// Offset of whatever comes after this field
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A field, and the exact bytes it occupies in a payload
#[derive(Debug, Clone, Copy)]
pub(crate) struct PropertySlice<'schema, 'record> {
    pub field: &'schema Field,
    pub buffer: &'record [u8],
}

/// The decoded value of a field, typed after its [`FieldKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'record> {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Pointer(Pointer),
    FileTime(FileTime),
    Guid(Guid),
    String(String),
    Binary(&'record [u8]),
    AddressList(AddressList<'record>),
}

impl<'record> Value<'record> {
    pub(crate) fn decode(
        slice: PropertySlice<'_, 'record>,
        pointer_size: PointerSize,
    ) -> ParserResult<Self> {
        let buffer = slice.buffer;
        let value = match slice.field.kind {
            FieldKind::Int8 => Value::Int8(decode::read(buffer, 0)?),
            FieldKind::UInt8 => Value::UInt8(decode::read(buffer, 0)?),
            FieldKind::Int16 => Value::Int16(decode::read(buffer, 0)?),
            FieldKind::UInt16 => Value::UInt16(decode::read(buffer, 0)?),
            FieldKind::Int32 => Value::Int32(decode::read(buffer, 0)?),
            FieldKind::UInt32 => Value::UInt32(decode::read(buffer, 0)?),
            FieldKind::Int64 => Value::Int64(decode::read(buffer, 0)?),
            FieldKind::UInt64 => Value::UInt64(decode::read(buffer, 0)?),
            FieldKind::Float => Value::Float(decode::read(buffer, 0)?),
            FieldKind::Double => Value::Double(decode::read(buffer, 0)?),
            FieldKind::Boolean => Value::Boolean(decode::read_bool(buffer, 0)?),
            FieldKind::Pointer => {
                Value::Pointer(Pointer(decode::read_pointer(buffer, 0, pointer_size)?))
            }
            FieldKind::FileTime => Value::FileTime(decode::read_filetime(buffer, 0)?),
            FieldKind::Guid => Value::Guid(decode::read_guid(buffer, 0)?),
            FieldKind::Binary(_) => Value::Binary(buffer),
            FieldKind::UnicodeString => Value::String(decode::read_utf16_string(buffer, 0)?.0),
            FieldKind::AnsiString => Value::String(decode::read_ansi_string(buffer, 0)?.0),
            FieldKind::TrailingAnsiString => {
                Value::String(decode::read_trailing_ansi_string(buffer, 0)?)
            }
            FieldKind::AddressList => {
                Value::AddressList(AddressList::new(buffer, pointer_size)?)
            }
        };

        Ok(value)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt8(v) => Some(v.into()),
            Value::UInt16(v) => Some(v.into()),
            Value::UInt32(v) => Some(v.into()),
            Value::UInt64(v) => Some(v),
            Value::Pointer(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_by_kind() {
        let field = Field::new("Value", FieldKind::UInt16);
        let slice = PropertySlice {
            field: &field,
            buffer: &[0x34, 0x12],
        };
        let value = Value::decode(slice, PointerSize::Bits64).unwrap();
        assert_eq!(value, Value::UInt16(0x1234));
        assert_eq!(value.as_u64(), Some(0x1234));
        assert_eq!(value.as_str(), None);

        let field = Field::new("Name", FieldKind::AnsiString);
        let slice = PropertySlice {
            field: &field,
            buffer: b"cmd.exe\0",
        };
        let value = Value::decode(slice, PointerSize::Bits64).unwrap();
        assert_eq!(value.as_str(), Some("cmd.exe"));
    }

    #[test]
    fn test_span_end() {
        let span = FieldSpan { offset: 8, len: 4 };
        assert_eq!(span.end(), 12);
    }
}
