//! Conversions from the Windows ETW structures
//!
//! This module interacts with the Windows native types and should abstract all `unsafe` accesses
use std::borrow::Cow;

use windows::core::GUID;
use windows::Win32::System::Diagnostics::Etw::{EVENT_DESCRIPTOR, EVENT_RECORD};

use crate::native::etw_types::{CpuTime, EventDescriptor, EventHeader, EventHeaderFlags, EventRecord};
use crate::native::guid::Guid;

impl From<GUID> for Guid {
    fn from(guid: GUID) -> Self {
        Guid::from_values(guid.data1, guid.data2, guid.data3, guid.data4)
    }
}

impl From<Guid> for GUID {
    fn from(guid: Guid) -> Self {
        GUID::from_values(guid.data1, guid.data2, guid.data3, guid.data4)
    }
}

fn descriptor(provider_id: GUID, raw: &EVENT_DESCRIPTOR) -> EventDescriptor {
    EventDescriptor {
        provider_id: provider_id.into(),
        id: raw.Id,
        version: raw.Version,
        channel: raw.Channel,
        level: raw.Level,
        opcode: raw.Opcode,
        task: raw.Task,
        keyword: raw.Keyword,
    }
}

impl<'a> EventRecord<'a> {
    /// Borrows an `EVENT_RECORD`, as received by an ETW consumer callback
    ///
    /// The payload is not copied. Use [`EventRecord::into_owned`] to keep the record past the callback.
    ///
    /// # Safety
    ///
    /// `UserData` must point to `UserDataLength` readable bytes (or be null, with a length of 0),
    /// that are not modified for `'a`.
    pub unsafe fn from_raw(raw: &'a EVENT_RECORD) -> Self {
        let header = &raw.EventHeader;
        let flags = EventHeaderFlags::from_bits_truncate(header.Flags);

        let cpu_time = if flags.contains(EventHeaderFlags::PRIVATE_SESSION) {
            CpuTime::Processor(header.Anonymous.ProcessorTime)
        } else if flags.contains(EventHeaderFlags::NO_CPUTIME) {
            CpuTime::None
        } else {
            CpuTime::KernelUser {
                kernel_time: header.Anonymous.Anonymous.KernelTime.into(),
                user_time: header.Anonymous.Anonymous.UserTime.into(),
            }
        };

        let event_header = EventHeader::new(descriptor(header.ProviderId, &header.EventDescriptor))
            .flags(flags)
            .process_id(header.ProcessId)
            .thread_id(header.ThreadId)
            .timestamp(header.TimeStamp)
            .processor_number(raw.BufferContext.Anonymous.Anonymous.ProcessorNumber)
            .cpu_time(cpu_time)
            .activity_id(header.ActivityId.into());

        let payload: &'a [u8] = if raw.UserData.is_null() || raw.UserDataLength == 0 {
            &[]
        } else {
            std::slice::from_raw_parts(raw.UserData as *const u8, raw.UserDataLength.into())
        };

        EventRecord::new(event_header, Cow::Borrowed(payload))
    }
}
