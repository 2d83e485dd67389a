//! Integrates with [serde](https://serde.rs/) enabling [`EventRecord`](crate::EventRecord)s to be serialized to various formats.
//!
//! Requires the `serde` feature be enabled.
//!
//! If the `time_rs` feature is enabled, then time stamps are serialized per the serialization format
//! of the time crate. Otherwise, if `time_rs` is not enabled, then timestamps are serialized as 64bit
//! unix timestamps.
//!
//! ```
//! use etwschema::schema_locator::SchemaLocator;
//! use etwschema::{EventRecord, EventSerializer};
//! extern crate serde_json;
//!
//! fn event_callback(record: &EventRecord) {
//!     match SchemaLocator::builtin().parser(record) {
//!         Err(err) => println!("Error {:?}", err),
//!         Ok(parser) => {
//!             // Generate a serializer for the record
//!             let ser = EventSerializer::from_parser(&parser, Default::default());
//!             // Pass the serializer to any serde compatible serializer
//!             match serde_json::to_value(ser) {
//!                 Err(err) => println!("Error {:?}", err),
//!                 Ok(json) => println!("{}", json),
//!             }
//!         }
//!     }
//! }
//! ```
#![cfg(feature = "serde")]

use serde::ser::{Serialize, SerializeMap, SerializeSeq, SerializeStruct};

use crate::native::etw_types::{CpuTime, EventDescriptor, EventHeader, EventRecord};
use crate::parser::{AddressList, Parser, Pointer};
use crate::property::Value;
use crate::schema::Schema;

/// Serialization options for EventSerializer
#[derive(Debug, Clone, Copy)]
pub struct EventSerializerOptions {
    /// Includes the name and descriptor of the schema in the serialized output.
    pub include_schema: bool,
    /// Includes the header metadata (process, thread, timestamp, cpu...) in the serialized output.
    pub include_header: bool,
    /// When `true` a field that fails to decode fails the whole serialization, otherwise it is serialized as a null value.
    pub fail_on_error: bool,
}

impl core::default::Default for EventSerializerOptions {
    fn default() -> Self {
        Self {
            include_schema: true,
            include_header: true,
            fail_on_error: false,
        }
    }
}

/// Used to serialize [`EventRecord`](crate::EventRecord)s using [serde](https://serde.rs/)
pub struct EventSerializer<'a, 'schema, 'record> {
    pub(crate) parser: &'a Parser<'schema, 'record>,
    pub(crate) options: EventSerializerOptions,
}

impl<'a, 'schema, 'record> EventSerializer<'a, 'schema, 'record> {
    /// Creates an event serializer object, sharing the offsets `parser` resolved already.
    pub fn from_parser(
        parser: &'a Parser<'schema, 'record>,
        options: EventSerializerOptions,
    ) -> Self {
        Self { parser, options }
    }
}

impl serde::ser::Serialize for EventSerializer<'_, '_, '_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let mut state = serializer.serialize_struct("Record", 3)?;

        if self.options.include_schema {
            state.serialize_field("Schema", &SchemaSer::new(self.parser.schema()))?;
        } else {
            state.skip_field("Schema")?;
        }

        if self.options.include_header {
            state.serialize_field("Header", &HeaderSer::new(self.parser.record()))?;
        } else {
            state.skip_field("Header")?;
        }

        let event = EventSer::new(self.parser, &self.options);
        state.serialize_field("Event", &event)?;

        state.end()
    }
}

struct SchemaSer<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaSer<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }
}

impl serde::ser::Serialize for SchemaSer<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Schema", 2)?;
        state.serialize_field("Name", self.schema.name())?;
        state.serialize_field("Descriptor", self.schema.descriptor())?;
        state.end()
    }
}

struct HeaderSer<'a> {
    record: &'a EventRecord<'a>,
}

impl<'a> HeaderSer<'a> {
    fn new(record: &'a EventRecord<'a>) -> Self {
        Self { record }
    }
}

impl serde::ser::Serialize for HeaderSer<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let header: &EventHeader = self.record.header();
        let mut state = serializer.serialize_struct("Header", 11)?;
        state.serialize_field("Flags", &self.record.event_flags().bits())?;
        state.serialize_field("PointerSize", &self.record.pointer_size().bytes())?;
        state.serialize_field("ThreadId", &self.record.thread_id())?;
        state.serialize_field("ProcessId", &self.record.process_id())?;
        state.serialize_field("TimeStamp", &self.record.timestamp_as_filetime())?;
        state.serialize_field("ProcessorNumber", &self.record.processor_number())?;
        match header.cpu_time {
            CpuTime::KernelUser { .. } => {
                state.serialize_field("KernelTime", &self.record.kernel_time())?;
                state.serialize_field("UserTime", &self.record.user_time())?;
                state.skip_field("ProcessorTime")?;
            }
            CpuTime::Processor(_) => {
                state.skip_field("KernelTime")?;
                state.skip_field("UserTime")?;
                state.serialize_field("ProcessorTime", &self.record.processor_time())?;
            }
            CpuTime::None => {
                state.skip_field("KernelTime")?;
                state.skip_field("UserTime")?;
                state.skip_field("ProcessorTime")?;
            }
        }
        state.serialize_field("ActivityId", &self.record.activity_id())?;
        state.serialize_field("Descriptor", self.record.descriptor())?;
        state.end()
    }
}

impl serde::ser::Serialize for EventDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let mut state = serializer.serialize_struct("Descriptor", 8)?;
        state.serialize_field("ProviderId", &self.provider_id)?;
        state.serialize_field("Id", &self.id)?;
        state.serialize_field("Version", &self.version)?;
        state.serialize_field("Channel", &self.channel)?;
        state.serialize_field("Level", &self.level)?;
        state.serialize_field("Opcode", &self.opcode)?;
        state.serialize_field("Task", &self.task)?;
        state.serialize_field("Keyword", &self.keyword)?;
        state.end()
    }
}

struct EventSer<'a, 'schema, 'record> {
    parser: &'a Parser<'schema, 'record>,
    options: &'a EventSerializerOptions,
}

impl<'a, 'schema, 'record> EventSer<'a, 'schema, 'record> {
    fn new(parser: &'a Parser<'schema, 'record>, options: &'a EventSerializerOptions) -> Self {
        Self { parser, options }
    }
}

impl serde::ser::Serialize for EventSer<'_, '_, '_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let len = self.parser.schema().property_count();
        let mut state = serializer.serialize_map(Some(len))?;
        for (name, value) in self.parser.values() {
            match value {
                Ok(v) => state.serialize_entry(name, &v)?,
                Err(e) if self.options.fail_on_error => {
                    return Err(serde::ser::Error::custom(format!("{}: {}", name, e)));
                }
                Err(_) => state.serialize_entry(name, &Option::<Value>::None)?,
            }
        }
        state.end()
    }
}

impl serde::ser::Serialize for Pointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl serde::ser::Serialize for AddressList<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for address in self.iter() {
            seq.serialize_element(&address)?;
        }
        seq.end()
    }
}

impl serde::ser::Serialize for Value<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::UInt8(v) => serializer.serialize_u8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::Pointer(v) => v.serialize(serializer),
            Value::FileTime(v) => v.serialize(serializer),
            Value::Guid(v) => v.serialize(serializer),
            Value::String(v) => serializer.serialize_str(v),
            Value::Binary(v) => serializer.serialize_bytes(v),
            Value::AddressList(v) => v.serialize(serializer),
        }
    }
}
