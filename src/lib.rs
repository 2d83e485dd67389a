//! # Typed, zero-copy views over ETW event payloads
//! This crate decodes the payloads of [Event Tracing for Windows](https://docs.microsoft.com/en-us/windows/win32/etw/about-event-tracing)
//! events into strongly-typed fields, without copying them.
//!
//! # What's in an ETW payload
//! An ETW event is made of a header (provider, event id, version, opcode, process, thread, timestamp...)
//! and of a payload (a.k.a. "user data"): the event fields, laid out back to back without padding nor
//! offsets table. Some fields have a fixed size, some depend on the emitting process (pointers are 4
//! or 8 bytes long), some have to be scanned (NUL-terminated strings), and some run to the end of the
//! payload (e.g. call stacks).
//! The offset of a field is therefore only known once every field before it has been sized.
//!
//! This crate does not start, control nor consume trace sessions. It takes events that were
//! captured elsewhere (in real time, or read from an `.etl` file, possibly on another OS), and
//! decodes them.
//!
//! # How it works
//! * A [`Schema`](schema::Schema) describes the fields of one kind of event. Schemas are declarative,
//!   `static` tables. The [`provider`] module contains a few well-known ones.
//! * A [`Parser`] decodes one [`EventRecord`] according to a schema. It resolves field offsets
//!   lazily, left to right, and caches them, so that reading fields in any order scans each string
//!   at most once.
//! * The [`event_view!`] macro generates a typed struct (an [`EventView`](view::EventView)) with
//!   one accessor per field, on top of a parser.
//! * A [`SchemaLocator`] routes a record to its schema.
//!
//! Malformed or truncated payloads never cause out of bounds reads: they are reported as
//! [`ParserError`](parser::ParserError)s, field by field.
//!
//! # Getting started
//! ```
//! use etwschema::native::etw_types::{EventHeader, EventRecord, PointerSize};
//! use etwschema::provider::image_load::{ImageLoad, IMAGE_LOAD_V3};
//! use etwschema::view::EventView;
//!
//! fn process_record(record: &EventRecord) {
//!     // Basic event scrutinizing can be done directly from the `EventRecord`
//!     if !ImageLoad::matches(record) {
//!         return;
//!     }
//!
//!     // Fields are decoded with typed views
//!     // In actual code, be sure to correctly handle Err values!
//!     let image_load = ImageLoad::new(record).unwrap();
//!     let process_id = image_load.process_id().unwrap();
//!     let file_name = image_load.file_name().unwrap();
//!     println!("PID: {} FileName: {}", process_id, file_name);
//! }
//!
//! // A record would usually come from a trace. Here is a hand-made one, for a 32-bit process
//! let mut payload = Vec::new();
//! payload.extend_from_slice(&0x0040_0000u32.to_le_bytes()); // ImageBase
//! payload.extend_from_slice(&0x0001_0000u32.to_le_bytes()); // ImageSize
//! payload.extend_from_slice(&1234u32.to_le_bytes()); // ProcessId
//! payload.extend_from_slice(&[0; 4 * 3]); // ImageCheckSum, TimeDateStamp, Reserved0
//! payload.extend_from_slice(&0x0040_0000u32.to_le_bytes()); // DefaultBase
//! payload.extend_from_slice(&[0; 4 * 4]); // Reserved1..4
//! for unit in "app.exe".encode_utf16().chain(Some(0)) {
//!     payload.extend_from_slice(&unit.to_le_bytes()); // FileName
//! }
//!
//! let header = EventHeader::new(*IMAGE_LOAD_V3.descriptor()).pointer_size(PointerSize::Bits32);
//! process_record(&EventRecord::new(header, payload));
//! ```
//!
//! # Log messages
//! etwschema may occasionally write debug and trace log messages using the [`log`](https://docs.rs/log/latest/log/) crate.<br/>
//! In case you want them to be printed to the console, your binary should use one of the various logger implementations. [`env_logger`](https://docs.rs/env_logger/latest/env_logger/) is one of them.<br/>
//! You can have a look at how to use it in the `demos/` folder in the repository.

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate num_derive;
extern crate num_traits;

pub mod view;

pub mod native;
pub mod parser;
pub mod property;
pub mod provider;
pub mod schema;
pub mod schema_locator;
pub mod ser;

// Convenience re-exports.
pub use crate::native::etw_types::EventRecord;
pub use crate::native::guid::Guid;
pub use crate::parser::Parser;
pub use crate::schema_locator::SchemaLocator;
#[cfg(feature = "serde")]
pub use crate::ser::{EventSerializer, EventSerializerOptions};
