//! ETW Types Parser
//!
//! This module acts as a helper to parse the payload of an ETW event, according to its [`Schema`].
//!
//! Fields are laid out back to back, so the offset of a field is the sum of the sizes of every
//! field before it, some of which (strings) can only be sized by scanning the payload. A [`Parser`]
//! resolves these offsets lazily, left to right, and remembers them: accessing fields in any order
//! scans each variable-length field at most once.
use std::fmt;

use once_cell::unsync::OnceCell;

use crate::native::etw_types::{EventRecord, PointerSize};
use crate::native::guid::Guid;
use crate::native::time::FileTime;
use crate::property::{FieldSpan, PropertySlice, Value};
use crate::schema::{FieldKind, Schema, SchemaKey};

pub mod decode;
pub use decode::AddressList;

/// Parser module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// No field has this name (or index)
    NotFound,
    /// The field cannot be parsed into the requested type
    InvalidType,
    /// The payload ends before the requested bytes
    BufferTooShort {
        offset: usize,
        len: usize,
        available: usize,
    },
    /// A range whose end comes before its start
    InvalidRange { start: usize, end: usize },
    /// No NUL terminator before the end of the payload
    UnterminatedString { offset: usize },
    /// A trailing array whose length is not a multiple of its element size
    MisalignedArray { len: usize, element_size: usize },
    /// The record does not have the identity the schema was declared for
    SchemaMismatch {
        expected: SchemaKey,
        found: SchemaKey,
    },
    /// An error while transforming an Utf-8 buffer into String
    Utf8Error(std::str::Utf8Error),
}

impl From<std::str::Utf8Error> for ParserError {
    fn from(err: std::str::Utf8Error) -> Self {
        ParserError::Utf8Error(err)
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::InvalidType => write!(f, "invalid type"),
            Self::BufferTooShort {
                offset,
                len,
                available,
            } => write!(
                f,
                "buffer too short: {} bytes requested at offset {}, {} available",
                len, offset, available
            ),
            Self::InvalidRange { start, end } => {
                write!(f, "invalid range {}..{}", start, end)
            }
            Self::UnterminatedString { offset } => {
                write!(f, "unterminated string at offset {}", offset)
            }
            Self::MisalignedArray { len, element_size } => write!(
                f,
                "misaligned array: {} bytes for {}-byte elements",
                len, element_size
            ),
            Self::SchemaMismatch { expected, found } => {
                write!(f, "schema mismatch: expected {}, found {}", expected, found)
            }
            Self::Utf8Error(e) => write!(f, "utf-8 error {}", e),
        }
    }
}

impl std::error::Error for ParserError {}

pub type ParserResult<T> = Result<T, ParserError>;

/// Represents a Parser
///
/// This structure provides a way to parse an ETW event (= extract its fields).
/// Because fields may have variable length (e.g. strings), a `Parser` is only suited to a single
/// [`EventRecord`]. It is cheap to create, and is meant to live as long as the record is processed.
///
/// A `Parser` is `!Sync`: its offset cache is filled through shared references.
///
/// # Example
/// ```
/// # use etwschema::EventRecord;
/// # use etwschema::schema_locator::SchemaLocator;
/// # use etwschema::parser::Parser;
/// let my_callback = |record: &EventRecord| {
///     let schema = match SchemaLocator::builtin().event_schema(record) {
///         Ok(schema) => schema,
///         Err(_) => return,
///     };
///     let parser = Parser::create_unchecked(record, schema);
///
///     // There are several ways to define the type requested for `try_parse`
///     // It is possible to use type inference...
///     let property1: Option<String> = parser.try_parse("FileName").ok();
///
///     // ...or to use the turbofish operator
///     match parser.try_parse::<u32>("ProcessId") {
///         Ok(_) => println!("ProcessId is a valid u32"),
///         Err(_) => println!("ProcessId is invalid"),
///     }
/// };
/// ```
pub struct Parser<'schema, 'record> {
    schema: &'schema Schema,
    record: &'record EventRecord<'record>,
    /// Resolved fields always form a prefix of the schema
    spans: Box<[OnceCell<FieldSpan>]>,
    #[cfg(test)]
    size_computations: std::cell::Cell<usize>,
}

impl<'schema, 'record> Parser<'schema, 'record> {
    /// Creates a parser, after checking that `schema` applies to `record`
    ///
    /// Fails with [`ParserError::SchemaMismatch`] when their provider, id, version or opcode differ.
    pub fn create(
        record: &'record EventRecord<'record>,
        schema: &'schema Schema,
    ) -> ParserResult<Self> {
        let expected = schema.key();
        let found = SchemaKey::new(record);
        if expected != found {
            log::debug!(
                "record {} cannot be parsed as {} ({})",
                found,
                schema.name(),
                expected
            );
            return Err(ParserError::SchemaMismatch { expected, found });
        }

        Ok(Self::create_unchecked(record, schema))
    }

    /// Creates a parser without checking the identity of `record`
    ///
    /// This is still memory safe: a wrong schema yields wrong values or errors, never out of bounds reads.
    pub fn create_unchecked(
        record: &'record EventRecord<'record>,
        schema: &'schema Schema,
    ) -> Self {
        Parser {
            schema,
            record,
            spans: (0..schema.property_count()).map(|_| OnceCell::new()).collect(),
            #[cfg(test)]
            size_computations: std::cell::Cell::new(0),
        }
    }

    pub fn schema(&self) -> &'schema Schema {
        self.schema
    }

    pub fn record(&self) -> &'record EventRecord<'record> {
        self.record
    }

    /// Offset and length of the field at `index`
    ///
    /// Resolves (and caches) every field between the last resolved one and `index`.
    /// Errors are not cached: a failing field fails again on every access, and so do the fields after it.
    pub fn field_span(&self, index: usize) -> ParserResult<FieldSpan> {
        if index >= self.spans.len() {
            return Err(ParserError::NotFound);
        }

        if let Some(span) = self.spans[index].get() {
            return Ok(*span);
        }

        let (first_unresolved, mut offset) = (0..index)
            .rev()
            .find_map(|i| self.spans[i].get().map(|span| (i + 1, span.end())))
            .unwrap_or((0, 0));

        let buffer = self.record.user_buffer();
        let pointer_size = self.record.pointer_size();
        let mut span = FieldSpan { offset, len: 0 };

        for (i, field) in self.schema.fields()[first_unresolved..=index]
            .iter()
            .enumerate()
        {
            let len = self.field_size(buffer, offset, field.kind, pointer_size)?;
            span = FieldSpan { offset, len };
            log::trace!(
                "{}: field {} ({}) at offset {}, {} bytes",
                self.schema.name(),
                first_unresolved + i,
                field.name,
                offset,
                len
            );

            // Cannot be set already, resolution only ever extends the prefix
            let _ = self.spans[first_unresolved + i].set(span);
            offset = span.end();
        }

        Ok(span)
    }

    fn field_size(
        &self,
        buffer: &[u8],
        offset: usize,
        kind: FieldKind,
        pointer_size: PointerSize,
    ) -> ParserResult<usize> {
        #[cfg(test)]
        self.size_computations.set(self.size_computations.get() + 1);

        decode::field_size(buffer, offset, kind, pointer_size)
    }

    /// Offset of the field named `name`
    pub fn offset_of(&self, name: &str) -> ParserResult<usize> {
        let index = self.index_of(name)?;
        self.field_span(index).map(|span| span.offset)
    }

    fn index_of(&self, name: &str) -> ParserResult<usize> {
        self.schema.field_index(name).ok_or(ParserError::NotFound)
    }

    fn field_kind(&self, index: usize) -> ParserResult<FieldKind> {
        self.schema
            .field(index)
            .map(|f| f.kind)
            .ok_or(ParserError::NotFound)
    }

    fn property_slice(&self, index: usize) -> ParserResult<PropertySlice<'schema, 'record>> {
        let field = self.schema.field(index).ok_or(ParserError::NotFound)?;
        let span = self.field_span(index)?;
        let buffer = decode::slice(self.record.user_buffer(), span.offset, span.len)?;
        Ok(PropertySlice { field, buffer })
    }

    /// Return a field of the event, or an error in case the parsing failed.
    ///
    /// You must explicitly define `T`, the type you want to parse the field into.<br/>
    /// In case this type is not compatible with the [`FieldKind`], [`ParserError::InvalidType`] is returned.
    pub fn try_parse<T>(&self, name: &str) -> ParserResult<T>
    where
        Parser<'schema, 'record>: private::TryParse<T>,
    {
        use crate::parser::private::TryParse;
        let index = self.index_of(name)?;
        self.try_parse_impl(index)
    }

    /// Same as [`Self::try_parse`], with the position of the field in the schema
    pub fn try_parse_at<T>(&self, index: usize) -> ParserResult<T>
    where
        Parser<'schema, 'record>: private::TryParse<T>,
    {
        use crate::parser::private::TryParse;
        self.try_parse_impl(index)
    }

    /// Decode a field into the [`Value`] matching its kind
    pub fn value(&self, name: &str) -> ParserResult<Value<'record>> {
        self.try_parse(name)
    }

    pub fn value_at(&self, index: usize) -> ParserResult<Value<'record>> {
        self.try_parse_at(index)
    }

    /// Every field, in schema order, with its decoded value
    pub fn values(
        &self,
    ) -> impl Iterator<Item = (&'schema str, ParserResult<Value<'record>>)> + '_ {
        self.schema
            .fields()
            .iter()
            .enumerate()
            .map(move |(i, field)| (field.name, self.value_at(i)))
    }

    #[cfg(test)]
    pub(crate) fn size_computations(&self) -> usize {
        self.size_computations.get()
    }
}

impl fmt::Debug for Parser<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("schema", &self.schema.name())
            .field("resolved", &self.spans.iter().filter(|s| s.get().is_some()).count())
            .field("fields", &self.spans.len())
            .finish()
    }
}

mod private {
    use super::*;

    /// Trait to try and parse a type
    ///
    /// This trait has to be implemented in order to be able to parse a type we want to retrieve from
    /// within an Event.
    ///
    /// An implementation for most of the Primitive Types is created by using a Macro, any other needed type
    /// requires this trait to be implemented
    pub trait TryParse<T> {
        /// Parse the field at `index` into `T`, or return an error if it cannot be
        fn try_parse_impl(&self, index: usize) -> Result<T, ParserError>;
    }
}

macro_rules! impl_try_parse_primitive {
    ($T:ident, $kind:ident) => {
        impl private::TryParse<$T> for Parser<'_, '_> {
            fn try_parse_impl(&self, index: usize) -> ParserResult<$T> {
                if self.field_kind(index)? != FieldKind::$kind {
                    return Err(ParserError::InvalidType);
                }

                let prop_slice = self.property_slice(index)?;
                decode::read::<$T>(prop_slice.buffer, 0)
            }
        }
    };
}

impl_try_parse_primitive!(u8, UInt8);
impl_try_parse_primitive!(i8, Int8);
impl_try_parse_primitive!(u16, UInt16);
impl_try_parse_primitive!(i16, Int16);
impl_try_parse_primitive!(u32, UInt32);
impl_try_parse_primitive!(i32, Int32);
impl_try_parse_primitive!(u64, UInt64);
impl_try_parse_primitive!(i64, Int64);
impl_try_parse_primitive!(f32, Float);
impl_try_parse_primitive!(f64, Double);

impl private::TryParse<bool> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<bool> {
        if self.field_kind(index)? != FieldKind::Boolean {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        decode::read_bool(prop_slice.buffer, 0)
    }
}

/// The `String` impl of the `TryParse` trait should be used to retrieve the following [`FieldKind`]s:
///
/// * UnicodeString
/// * AnsiString
/// * TrailingAnsiString
///
/// On success a `String` with the data from the field will be returned, without its terminator
///
/// # Example
/// ```
/// # use etwschema::EventRecord;
/// # use etwschema::parser::Parser;
/// # use etwschema::provider::image_load;
/// let my_callback = |record: &EventRecord| {
///     let parser = Parser::create(record, &image_load::IMAGE_LOAD_V3).unwrap();
///     let image_name: String = parser.try_parse("FileName").unwrap();
/// };
/// ```
impl private::TryParse<String> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<String> {
        let kind = self.field_kind(index)?;
        if !matches!(
            kind,
            FieldKind::UnicodeString | FieldKind::AnsiString | FieldKind::TrailingAnsiString
        ) {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        match kind {
            FieldKind::UnicodeString => Ok(decode::read_utf16_string(prop_slice.buffer, 0)?.0),
            FieldKind::AnsiString => Ok(decode::read_ansi_string(prop_slice.buffer, 0)?.0),
            _ => decode::read_trailing_ansi_string(prop_slice.buffer, 0),
        }
    }
}

impl private::TryParse<Guid> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> Result<Guid, ParserError> {
        if self.field_kind(index)? != FieldKind::Guid {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        decode::read_guid(prop_slice.buffer, 0)
    }
}

impl private::TryParse<FileTime> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<FileTime> {
        if self.field_kind(index)? != FieldKind::FileTime {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        decode::read_filetime(prop_slice.buffer, 0)
    }
}

/// A pointer-sized field, widened to 64 bits
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pointer(pub u64);

impl std::ops::Deref for Pointer {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for Pointer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Pointer> for u64 {
    fn from(p: Pointer) -> Self {
        p.0
    }
}

impl std::fmt::LowerHex for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val = self.0;

        std::fmt::LowerHex::fmt(&val, f) // delegate to u64 implementation
    }
}

impl std::fmt::UpperHex for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val = self.0;

        std::fmt::UpperHex::fmt(&val, f) // delegate to u64 implementation
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val = self.0;

        std::fmt::Display::fmt(&val, f) // delegate to u64 implementation
    }
}

impl private::TryParse<Pointer> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<Pointer> {
        if self.field_kind(index)? != FieldKind::Pointer {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        decode::read_pointer(prop_slice.buffer, 0, self.record.pointer_size()).map(Pointer)
    }
}

impl<'a, 'record: 'a> private::TryParse<AddressList<'a>> for Parser<'_, 'record> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<AddressList<'a>> {
        if self.field_kind(index)? != FieldKind::AddressList {
            return Err(ParserError::InvalidType);
        }

        let prop_slice = self.property_slice(index)?;
        AddressList::new(prop_slice.buffer, self.record.pointer_size())
    }
}

/// The raw bytes of any field
impl<'a, 'record: 'a> private::TryParse<&'a [u8]> for Parser<'_, 'record> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<&'a [u8]> {
        self.property_slice(index).map(|prop_slice| prop_slice.buffer)
    }
}

impl private::TryParse<Vec<u8>> for Parser<'_, '_> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<Vec<u8>> {
        self.property_slice(index)
            .map(|prop_slice| prop_slice.buffer.to_vec())
    }
}

impl<'a, 'record: 'a> private::TryParse<Value<'a>> for Parser<'_, 'record> {
    fn try_parse_impl(&self, index: usize) -> ParserResult<Value<'a>> {
        let prop_slice = self.property_slice(index)?;
        Value::decode(prop_slice, self.record.pointer_size())
    }
}
