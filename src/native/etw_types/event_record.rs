//! A read-only ETW event: header metadata plus its payload

use std::borrow::Cow;
use std::ops::{Bound, RangeBounds};

use crate::native::etw_types::{CpuTime, EventDescriptor, EventHeader, EventHeaderFlags, PointerSize};
use crate::native::guid::Guid;
use crate::native::time::FileTime;
use crate::parser::decode;
use crate::parser::{ParserError, ParserResult};

/// A read-only ETW event record
///
/// The payload (a.k.a. user data) is either borrowed from the capture layer, or owned.
/// It is never modified once the record is built.
#[derive(Debug, Clone)]
pub struct EventRecord<'a> {
    header: EventHeader,
    payload: Cow<'a, [u8]>,
}

impl<'a> EventRecord<'a> {
    pub fn new<P>(header: EventHeader, payload: P) -> Self
    where
        P: Into<Cow<'a, [u8]>>,
    {
        EventRecord {
            header,
            payload: payload.into(),
        }
    }

    /// Detach this record from the buffer it borrows (if any)
    pub fn into_owned(self) -> EventRecord<'static> {
        EventRecord {
            header: self.header,
            payload: Cow::Owned(self.payload.into_owned()),
        }
    }

    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    pub fn descriptor(&self) -> &EventDescriptor {
        &self.header.descriptor
    }

    pub fn provider_id(&self) -> Guid {
        self.header.descriptor.provider_id
    }

    pub fn event_id(&self) -> u16 {
        self.header.descriptor.id
    }

    pub fn opcode(&self) -> u8 {
        self.header.descriptor.opcode
    }

    pub fn version(&self) -> u8 {
        self.header.descriptor.version
    }

    pub fn level(&self) -> u8 {
        self.header.descriptor.level
    }

    pub fn channel(&self) -> u8 {
        self.header.descriptor.channel
    }

    pub fn task(&self) -> u16 {
        self.header.descriptor.task
    }

    pub fn keyword(&self) -> u64 {
        self.header.descriptor.keyword
    }

    pub fn event_flags(&self) -> EventHeaderFlags {
        self.header.flags
    }

    pub fn process_id(&self) -> u32 {
        self.header.process_id
    }

    pub fn thread_id(&self) -> u32 {
        self.header.thread_id
    }

    pub fn activity_id(&self) -> Guid {
        self.header.activity_id
    }

    /// The `TimeStamp` of the event
    ///
    /// As per [Microsoft's documentation](https://docs.microsoft.com/en-us/windows/win32/api/evntcons/ns-evntcons-event_header):
    /// > Contains the time that the event occurred.<br/>
    /// > The resolution is system time unless the `ProcessTraceMode member` of `EVENT_TRACE_LOGFILE`
    /// > contains the `PROCESS_TRACE_MODE_RAW_TIMESTAMP` flag, in which case the resolution depends
    /// > on the value of the `Wnode.ClientContext` member of `EVENT_TRACE_PROPERTIES` at the time
    /// > the controller created the session.
    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    /// The timestamp, assuming it has the default (system time) resolution
    pub fn timestamp_as_filetime(&self) -> FileTime {
        FileTime::from_quad(self.header.timestamp)
    }

    pub fn processor_number(&self) -> u8 {
        self.header.processor_number
    }

    pub fn cpu_time(&self) -> CpuTime {
        self.header.cpu_time
    }

    pub fn kernel_time(&self) -> Option<u64> {
        match self.header.cpu_time {
            CpuTime::KernelUser { kernel_time, .. } => Some(kernel_time),
            _ => None,
        }
    }

    pub fn user_time(&self) -> Option<u64> {
        match self.header.cpu_time {
            CpuTime::KernelUser { user_time, .. } => Some(user_time),
            _ => None,
        }
    }

    pub fn processor_time(&self) -> Option<u64> {
        match self.header.cpu_time {
            CpuTime::Processor(t) => Some(t),
            _ => None,
        }
    }

    /// Width of the pointer-sized fields of this event
    ///
    /// This is derived from the header flags: events logged by 32-bit processes have the
    /// `EVENT_HEADER_FLAG_32_BIT_HEADER` flag.
    pub fn pointer_size(&self) -> PointerSize {
        if self.header.flags.contains(EventHeaderFlags::HEADER_32_BIT) {
            PointerSize::Bits32
        } else {
            PointerSize::Bits64
        }
    }

    /// The whole payload (a.k.a. user data)
    pub fn user_buffer(&self) -> &[u8] {
        &self.payload
    }

    /// A sub-slice of the payload
    ///
    /// Returns [`ParserError::BufferTooShort`] rather than truncating when the range exceeds the
    /// payload, and [`ParserError::InvalidRange`] when it ends before it starts.
    pub fn payload_slice<R>(&self, range: R) -> ParserResult<&[u8]>
    where
        R: RangeBounds<usize>,
    {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.payload.len(),
        };

        if end < start {
            return Err(ParserError::InvalidRange { start, end });
        }

        decode::slice(&self.payload, start, end - start)
    }
}
