//! Microsoft-Windows-Kernel-Process
//!
//! The manifest-based counterpart of the kernel process and image events. Its `ProcessStart` event
//! gained fields over time, so this module also shows how to handle several versions of one event
//! (see [`AnyProcessStart`]).
use crate::native::etw_types::{EventDescriptor, EventRecord, Level};
use crate::native::guid::Guid;
use crate::native::time::FileTime;
use crate::parser::{ParserError, ParserResult, Pointer};
use crate::schema::FieldKind;
use crate::view::EventView;

/// Microsoft-Windows-Kernel-Process
pub const PROVIDER_GUID: Guid = Guid::from_values(
    0x22fb2cd6, 0x0e7b, 0x422b, [0xa0, 0xc7, 0x2f, 0xad, 0x1f, 0xd0, 0xe7, 0x16]);

pub const KEYWORD_PROCESS: u64 = 0x10;
pub const KEYWORD_IMAGE: u64 = 0x40;

pub const EVENT_PROCESS_START: u16 = 1;
pub const EVENT_IMAGE_LOAD: u16 = 5;

const OPCODE_INFO: u8 = 0;
const OPCODE_START: u8 = 1;

crate::event_view! {
    pub struct ProcessStart => PROCESS_START_V0 {
        name: "Kernel-Process/ProcessStart v0",
        descriptor: EventDescriptor::new(PROVIDER_GUID, EVENT_PROCESS_START, 0)
            .with_opcode(OPCODE_START)
            .with_level(Level::Information)
            .with_task(1)
            .with_keyword(KEYWORD_PROCESS),
        fields: {
            process_id: u32 = ("ProcessID", FieldKind::UInt32),
            create_time: FileTime = ("CreateTime", FieldKind::FileTime),
            parent_process_id: u32 = ("ParentProcessID", FieldKind::UInt32),
            session_id: u32 = ("SessionID", FieldKind::UInt32),
            image_name: String = ("ImageName", FieldKind::UnicodeString),
        }
    }
}

crate::event_view! {
    pub struct ProcessStartV1 => PROCESS_START_V1 {
        name: "Kernel-Process/ProcessStart v1",
        descriptor: EventDescriptor::new(PROVIDER_GUID, EVENT_PROCESS_START, 1)
            .with_opcode(OPCODE_START)
            .with_level(Level::Information)
            .with_task(1)
            .with_keyword(KEYWORD_PROCESS),
        fields: {
            process_id: u32 = ("ProcessID", FieldKind::UInt32),
            create_time: FileTime = ("CreateTime", FieldKind::FileTime),
            parent_process_id: u32 = ("ParentProcessID", FieldKind::UInt32),
            session_id: u32 = ("SessionID", FieldKind::UInt32),
            flags: u32 = ("Flags", FieldKind::UInt32),
            image_name: String = ("ImageName", FieldKind::UnicodeString),
            image_checksum: u32 = ("ImageChecksum", FieldKind::UInt32),
            time_date_stamp: u32 = ("TimeDateStamp", FieldKind::UInt32),
            /// Empty for non-packaged applications
            package_full_name: String = ("PackageFullName", FieldKind::UnicodeString),
            package_relative_app_id: String = ("PackageRelativeAppId", FieldKind::UnicodeString),
        }
    }
}

crate::event_view! {
    pub struct ImageLoad => IMAGE_LOAD_V0 {
        name: "Kernel-Process/ImageLoad v0",
        descriptor: EventDescriptor::new(PROVIDER_GUID, EVENT_IMAGE_LOAD, 0)
            .with_opcode(OPCODE_INFO)
            .with_level(Level::Information)
            .with_task(5)
            .with_keyword(KEYWORD_IMAGE),
        fields: {
            image_base: Pointer = ("ImageBase", FieldKind::Pointer),
            image_size: Pointer = ("ImageSize", FieldKind::Pointer),
            process_id: u32 = ("ProcessID", FieldKind::UInt32),
            image_checksum: u32 = ("ImageCheckSum", FieldKind::UInt32),
            time_date_stamp: u32 = ("TimeDateStamp", FieldKind::UInt32),
            default_base: Pointer = ("DefaultBase", FieldKind::Pointer),
            image_name: String = ("ImageName", FieldKind::UnicodeString),
        }
    }
}

/// A `ProcessStart` event, whatever its version
#[derive(Debug)]
pub enum AnyProcessStart<'record> {
    V0(ProcessStart<'record>),
    V1(ProcessStartV1<'record>),
}

impl<'record> AnyProcessStart<'record> {
    /// Picks the view matching the version of `record`
    pub fn new(record: &'record EventRecord<'record>) -> ParserResult<Self> {
        if ProcessStartV1::matches(record) {
            return ProcessStartV1::new(record).map(AnyProcessStart::V1);
        }

        ProcessStart::new(record).map(AnyProcessStart::V0)
    }

    pub fn process_id(&self) -> ParserResult<u32> {
        match self {
            Self::V0(v) => v.process_id(),
            Self::V1(v) => v.process_id(),
        }
    }

    pub fn parent_process_id(&self) -> ParserResult<u32> {
        match self {
            Self::V0(v) => v.parent_process_id(),
            Self::V1(v) => v.parent_process_id(),
        }
    }

    pub fn create_time(&self) -> ParserResult<FileTime> {
        match self {
            Self::V0(v) => v.create_time(),
            Self::V1(v) => v.create_time(),
        }
    }

    pub fn image_name(&self) -> ParserResult<String> {
        match self {
            Self::V0(v) => v.image_name(),
            Self::V1(v) => v.image_name(),
        }
    }

    /// Only version 1 and later carry the package name
    pub fn package_full_name(&self) -> ParserResult<String> {
        match self {
            Self::V0(_) => Err(ParserError::NotFound),
            Self::V1(v) => v.package_full_name(),
        }
    }
}
