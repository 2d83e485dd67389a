//! Basic ETW types
//!
//! The `etw_types` module models the out-of-band part of an ETW event: the identity of its schema
//! ([EventDescriptor]) and the header metadata recorded next to every payload ([EventHeader]).
//!
//! These mirror the `EVENT_DESCRIPTOR` and `EVENT_HEADER` Windows structures, but they do not depend
//! on Windows so that payloads can be decoded on any platform (e.g. when post-processing `.etl`
//! dumps elsewhere)
use crate::native::guid::Guid;
use num_traits::FromPrimitive;

mod event_record;
pub use event_record::EventRecord;

/// Severity level of an event
///
/// See [EVENT_DESCRIPTOR.Level](https://docs.microsoft.com/en-us/windows/win32/api/evntprov/ns-evntprov-event_descriptor)
#[repr(u8)]
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq, Hash)]
pub enum Level {
    LogAlways = 0,
    Critical = 1,
    Error = 2,
    Warning = 3,
    Information = 4,
    Verbose = 5,
}

/// Schema identity of an event
///
/// A superset of the Windows `EVENT_DESCRIPTOR`, since it also carries the provider GUID.
/// Every event view declares one of these, and a record is routed to the view with the same
/// [`SchemaKey`](crate::schema::SchemaKey) (i.e. provider, id, version and opcode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventDescriptor {
    pub provider_id: Guid,
    pub id: u16,
    pub version: u8,
    pub channel: u8,
    /// Raw level, see [`Self::level`]
    pub level: u8,
    pub opcode: u8,
    pub task: u16,
    pub keyword: u64,
}

impl EventDescriptor {
    pub const fn new(provider_id: Guid, id: u16, version: u8) -> Self {
        EventDescriptor {
            provider_id,
            id,
            version,
            channel: 0,
            level: 0,
            opcode: 0,
            task: 0,
            keyword: 0,
        }
    }

    pub const fn with_opcode(mut self, opcode: u8) -> Self {
        self.opcode = opcode;
        self
    }

    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = level as u8;
        self
    }

    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub const fn with_task(mut self, task: u16) -> Self {
        self.task = task;
        self
    }

    pub const fn with_keyword(mut self, keyword: u64) -> Self {
        self.keyword = keyword;
        self
    }

    /// The level as a known [`Level`], or `None` for provider-defined levels (above 5)
    pub fn level(&self) -> Option<Level> {
        Level::from_u8(self.level)
    }
}

bitflags! {
    /// Represents the `EVENT_HEADER.Flags` values
    ///
    /// See: [EVENT_HEADER](https://docs.microsoft.com/en-us/windows/win32/api/evntcons/ns-evntcons-event_header)
    #[derive(Default)]
    pub struct EventHeaderFlags: u16 {
        const EXTENDED_INFO = 0x0001;
        const PRIVATE_SESSION = 0x0002;
        const STRING_ONLY = 0x0004;
        const TRACE_MESSAGE = 0x0008;
        const NO_CPUTIME = 0x0010;
        const HEADER_32_BIT = 0x0020;
        const HEADER_64_BIT = 0x0040;
        const DECODE_GUID = 0x0080;
        const CLASSIC_HEADER = 0x0100;
        const PROCESSOR_INDEX = 0x0200;
    }
}

/// Width of the pointers of the process that emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerSize {
    /// 4-byte pointers
    Bits32,
    /// 8-byte pointers
    Bits64,
}

impl PointerSize {
    pub const fn bytes(self) -> usize {
        match self {
            PointerSize::Bits32 => 4,
            PointerSize::Bits64 => 8,
        }
    }

    /// Pointer size of the current process
    pub const fn host() -> Self {
        if cfg!(target_pointer_width = "32") {
            PointerSize::Bits32
        } else {
            PointerSize::Bits64
        }
    }
}

impl From<PointerSize> for usize {
    fn from(val: PointerSize) -> Self {
        val.bytes()
    }
}

/// CPU time counters recorded in the header
///
/// `EVENT_HEADER` stores these in a union: either kernel and user times, or a single processor
/// time (for private sessions), or nothing meaningful when the session disabled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuTime {
    None,
    KernelUser { kernel_time: u64, user_time: u64 },
    Processor(u64),
}

impl Default for CpuTime {
    fn default() -> Self {
        CpuTime::None
    }
}

/// Header metadata recorded alongside every event payload
///
/// Built with chained setters, then handed to [`EventRecord::new`]
///
/// # Example
/// ```
/// # use etwschema::native::etw_types::{EventDescriptor, EventHeader, PointerSize};
/// # use etwschema::Guid;
/// let descriptor = EventDescriptor::new(Guid::from_u128(0x22fb2cd6_0e7b_422b_a0c7_2fad1fd0e716), 1, 0);
/// let header = EventHeader::new(descriptor)
///     .process_id(4)
///     .thread_id(8)
///     .pointer_size(PointerSize::Bits32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    pub(crate) descriptor: EventDescriptor,
    pub(crate) flags: EventHeaderFlags,
    pub(crate) process_id: u32,
    pub(crate) thread_id: u32,
    pub(crate) timestamp: i64,
    pub(crate) processor_number: u8,
    pub(crate) cpu_time: CpuTime,
    pub(crate) activity_id: Guid,
}

impl EventHeader {
    /// A header for a 64-bit process, with everything else zeroed
    pub fn new(descriptor: EventDescriptor) -> Self {
        EventHeader {
            descriptor,
            flags: EventHeaderFlags::HEADER_64_BIT,
            process_id: 0,
            thread_id: 0,
            timestamp: 0,
            processor_number: 0,
            cpu_time: CpuTime::None,
            activity_id: Guid::default(),
        }
    }

    /// Replaces every flag. This also sets the pointer size, see [`EventRecord::pointer_size`]
    pub fn flags(mut self, flags: EventHeaderFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn pointer_size(mut self, pointer_size: PointerSize) -> Self {
        self.flags
            .remove(EventHeaderFlags::HEADER_32_BIT | EventHeaderFlags::HEADER_64_BIT);
        match pointer_size {
            PointerSize::Bits32 => self.flags.insert(EventHeaderFlags::HEADER_32_BIT),
            PointerSize::Bits64 => self.flags.insert(EventHeaderFlags::HEADER_64_BIT),
        }
        self
    }

    pub fn process_id(mut self, process_id: u32) -> Self {
        self.process_id = process_id;
        self
    }

    pub fn thread_id(mut self, thread_id: u32) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// 100ns intervals since 1601, unless the session uses raw timestamps
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn processor_number(mut self, processor_number: u8) -> Self {
        self.processor_number = processor_number;
        self
    }

    pub fn cpu_time(mut self, cpu_time: CpuTime) -> Self {
        self.cpu_time = cpu_time;
        self
    }

    pub fn activity_id(mut self, activity_id: Guid) -> Self {
        self.activity_id = activity_id;
        self
    }
}
