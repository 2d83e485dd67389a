//! ETW Event Schema
//!
//! A [`Schema`] describes the layout of the payload of one event: the ordered list of its fields,
//! and the [`EventDescriptor`] of the events it applies to.
//!
//! Schemas are plain data, usually declared as `static`s (see the [`event_view!`](crate::event_view)
//! macro and the [`provider`](crate::provider) module), and looked up with a
//! [`SchemaLocator`](crate::schema_locator::SchemaLocator).
use std::fmt;

use crate::native::etw_types::{EventDescriptor, EventRecord, PointerSize};
use crate::parser::decode::{BOOL_SIZE, GUID_SIZE};
use crate::native::guid::Guid;

/// Wire encoding of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    /// 4-byte Win32 `BOOL`
    Boolean,
    /// 4 or 8 bytes, depending on the [`PointerSize`] of the event
    Pointer,
    /// 8-byte count of 100ns intervals since 1601
    FileTime,
    Guid,
    /// Opaque bytes of a fixed length
    Binary(u16),
    /// NUL-terminated UTF-16
    UnicodeString,
    /// NUL-terminated 8-bit string
    AnsiString,
    /// 8-bit string running to the end of the payload. Must be the last field.
    TrailingAnsiString,
    /// Pointer-sized integers running to the end of the payload. Must be the last field.
    AddressList,
}

impl FieldKind {
    /// Size of a field of this kind, when it does not depend on its content
    pub const fn fixed_size(self, pointer_size: PointerSize) -> Option<usize> {
        let size = match self {
            FieldKind::Int8 | FieldKind::UInt8 => 1,
            FieldKind::Int16 | FieldKind::UInt16 => 2,
            FieldKind::Int32 | FieldKind::UInt32 | FieldKind::Float => 4,
            FieldKind::Int64 | FieldKind::UInt64 | FieldKind::Double | FieldKind::FileTime => 8,
            FieldKind::Boolean => BOOL_SIZE,
            FieldKind::Pointer => pointer_size.bytes(),
            FieldKind::Guid => GUID_SIZE,
            FieldKind::Binary(len) => len as usize,
            FieldKind::UnicodeString
            | FieldKind::AnsiString
            | FieldKind::TrailingAnsiString
            | FieldKind::AddressList => return None,
        };
        Some(size)
    }

    /// Whether a field of this kind consumes the rest of the payload
    pub const fn is_trailing(self) -> bool {
        matches!(self, FieldKind::TrailingAnsiString | FieldKind::AddressList)
    }
}

/// A named field of a [`Schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Field { name, kind }
    }
}

/// The identity used to match an event with its schema
///
/// The level, channel, task and keyword of a descriptor do not change the layout of a payload,
/// so they are not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    pub provider: Guid,
    pub id: u16,
    pub version: u8,
    pub opcode: u8,
}

impl SchemaKey {
    pub fn new(record: &EventRecord) -> Self {
        Self::from(record.descriptor())
    }
}

impl From<&EventDescriptor> for SchemaKey {
    fn from(descriptor: &EventDescriptor) -> Self {
        SchemaKey {
            provider: descriptor.provider_id,
            id: descriptor.id,
            version: descriptor.version,
            opcode: descriptor.opcode,
        }
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} id {} v{} opcode {}",
            self.provider, self.id, self.version, self.opcode
        )
    }
}

/// Layout of the payload of an event
///
/// Fields are laid out back to back, in order, without padding. Their offsets therefore depend on
/// the content of the variable-length fields that precede them, and are computed by a
/// [`Parser`](crate::parser::Parser).
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    descriptor: EventDescriptor,
    fields: &'static [Field],
}

impl Schema {
    pub const fn new(
        name: &'static str,
        descriptor: EventDescriptor,
        fields: &'static [Field],
    ) -> Self {
        Schema {
            name,
            descriptor,
            fields,
        }
    }

    /// A human-readable name, e.g. `Image/Load`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> &EventDescriptor {
        &self.descriptor
    }

    pub fn provider_id(&self) -> Guid {
        self.descriptor.provider_id
    }

    pub fn event_id(&self) -> u16 {
        self.descriptor.id
    }

    pub fn event_version(&self) -> u8 {
        self.descriptor.version
    }

    pub fn opcode(&self) -> u8 {
        self.descriptor.opcode
    }

    pub fn key(&self) -> SchemaKey {
        SchemaKey::from(&self.descriptor)
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    pub fn field(&self, index: usize) -> Option<&'static Field> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn property_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether `record` has the identity this schema was declared for
    pub fn matches(&self, record: &EventRecord) -> bool {
        self.key() == SchemaKey::new(record)
    }

    /// Size of the payload, if every field has a fixed size
    pub fn fixed_size(&self, pointer_size: PointerSize) -> Option<usize> {
        self.fields
            .iter()
            .map(|f| f.kind.fixed_size(pointer_size))
            .sum()
    }

    /// Checks that trailing fields (if any) are last, and that names are unique
    pub fn is_well_formed(&self) -> bool {
        let trailing_ok = self
            .fields
            .iter()
            .rev()
            .skip(1)
            .all(|f| !f.kind.is_trailing());

        let names_ok = self
            .fields
            .iter()
            .enumerate()
            .all(|(i, f)| self.field_index(f.name) == Some(i));

        trailing_ok && names_ok
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.fields == other.fields
    }
}

impl Eq for Schema {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::etw_types::EventHeader;

    const PROVIDER: Guid = Guid::from_u128(0x2cb15d1d_5fc1_11d2_abe1_00a0c911f518);

    static SAMPLE: Schema = Schema::new(
        "Sample",
        EventDescriptor::new(PROVIDER, 0, 3).with_opcode(10),
        &[
            Field::new("Base", FieldKind::Pointer),
            Field::new("Pid", FieldKind::UInt32),
            Field::new("Name", FieldKind::UnicodeString),
        ],
    );

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(FieldKind::Pointer.fixed_size(PointerSize::Bits32), Some(4));
        assert_eq!(FieldKind::Pointer.fixed_size(PointerSize::Bits64), Some(8));
        assert_eq!(FieldKind::Boolean.fixed_size(PointerSize::Bits64), Some(4));
        assert_eq!(FieldKind::Binary(6).fixed_size(PointerSize::Bits64), Some(6));
        assert_eq!(FieldKind::UnicodeString.fixed_size(PointerSize::Bits64), None);
        assert!(FieldKind::AddressList.is_trailing());
        assert!(!FieldKind::AnsiString.is_trailing());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(SAMPLE.field_index("Pid"), Some(1));
        assert_eq!(SAMPLE.field_index("pid"), None);
        assert_eq!(SAMPLE.field(2).map(|f| f.kind), Some(FieldKind::UnicodeString));
        assert_eq!(SAMPLE.property_count(), 3);
        assert_eq!(SAMPLE.fixed_size(PointerSize::Bits64), None);
        assert!(SAMPLE.is_well_formed());
    }

    #[test]
    fn test_matches_ignores_level() {
        use crate::native::etw_types::Level;

        let descriptor = EventDescriptor::new(PROVIDER, 0, 3)
            .with_opcode(10)
            .with_level(Level::Verbose);
        let record = EventRecord::new(EventHeader::new(descriptor), Vec::new());
        assert!(SAMPLE.matches(&record));

        let other_version = EventDescriptor::new(PROVIDER, 0, 2).with_opcode(10);
        let record = EventRecord::new(EventHeader::new(other_version), Vec::new());
        assert!(!SAMPLE.matches(&record));
    }

    #[test]
    fn test_ill_formed() {
        static TRAILING_FIRST: Schema = Schema::new(
            "Bad",
            EventDescriptor::new(PROVIDER, 1, 0),
            &[
                Field::new("Stack", FieldKind::AddressList),
                Field::new("Pid", FieldKind::UInt32),
            ],
        );
        static DUPLICATE: Schema = Schema::new(
            "Bad",
            EventDescriptor::new(PROVIDER, 1, 0),
            &[
                Field::new("Pid", FieldKind::UInt32),
                Field::new("Pid", FieldKind::UInt32),
            ],
        );
        assert!(!TRAILING_FIRST.is_well_formed());
        assert!(!DUPLICATE.is_well_formed());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(
            SAMPLE.key().to_string(),
            "{2cb15d1d-5fc1-11d2-abe1-00a0c911f518} id 0 v3 opcode 10"
        );
    }
}
