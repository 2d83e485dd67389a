//! ETW Providers catalog.
//!
//! Event views for a handful of well-known [ETW Providers](https://docs.microsoft.com/en-us/windows/win32/etw/about-event-tracing#providers),
//! along with the GUIDs of the kernel providers.
//!
//! Each submodule declares the [`Schema`]s (and the matching typed views) of one provider.
//! [`all_schemas`] lists every one of them, and feeds [`SchemaLocator::builtin`](crate::schema_locator::SchemaLocator::builtin).
use crate::native::guid::Guid;
use crate::schema::Schema;

pub mod dns_client;
pub mod image_load;
pub mod kernel_process;
pub mod stack_walk;

/// List of Kernel Providers GUIDs
///
/// These are the provider ids of classic (MOF-based) kernel events. Such events all have an id of 0,
/// and are told apart by their opcode.
///
/// Credits: [KrabsETW::kernel_guids](https://github.com/microsoft/krabsetw/blob/master/krabs/krabs/kernel_guids.hpp)
pub mod kernel_guids {
    use super::Guid;
    pub const ALPC_GUID: Guid = Guid::from_values(
        0x45d8cccd, 0x539f, 0x4b72, [0xa8, 0xb7, 0x5c, 0x68, 0x31, 0x42, 0x60, 0x9a]);
    pub const DISK_IO_GUID: Guid = Guid::from_values(
        0x3d6fa8d4, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c]);
    pub const FILE_IO_GUID: Guid = Guid::from_values(
        0x90cbdc39, 0x4a3e, 0x11d1, [0x84, 0xf4, 0x00, 0x00, 0xf8, 0x04, 0x64, 0xe3]);
    pub const IMAGE_LOAD_GUID: Guid = Guid::from_values(
        0x2cb15d1d, 0x5fc1, 0x11d2, [0xab, 0xe1, 0x00, 0xa0, 0xc9, 0x11, 0xf5, 0x18]);
    pub const PAGE_FAULT_GUID: Guid = Guid::from_values(
        0x3d6fa8d3, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c]);
    pub const PERF_INFO_GUID: Guid = Guid::from_values(
        0xce1dbfb4, 0x137e, 0x4da6, [0x87, 0xb0, 0x3f, 0x59, 0xaa, 0x10, 0x2c, 0xbc]);
    pub const PROCESS_GUID: Guid = Guid::from_values(
        0x3d6fa8d0, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c]);
    pub const REGISTRY_GUID: Guid = Guid::from_values(
        0xAE53722E, 0xC863, 0x11d2, [0x86, 0x59, 0x00, 0xC0, 0x4F, 0xA3, 0x21, 0xA1]);
    pub const STACK_WALK_GUID: Guid = Guid::from_values(
        0xdef2fe46, 0x7bd6, 0x4b80, [0xbd, 0x94, 0xf5, 0x7f, 0xe2, 0x0d, 0x0c, 0xe3]);
    pub const SYSTEM_TRACE_GUID: Guid = Guid::from_values(
        0x9e814aad, 0x3204, 0x11d2, [0x9a, 0x82, 0x00, 0x60, 0x08, 0xa8, 0x69, 0x39]);
    pub const TCP_IP_GUID: Guid = Guid::from_values(
        0x9a280ac0, 0xc8e0, 0x11d1, [0x84, 0xe2, 0x00, 0xc0, 0x4f, 0xb9, 0x98, 0xa2]);
    pub const THREAD_GUID: Guid = Guid::from_values(
        0x3d6fa8d1, 0xfe05, 0x11d0, [0x9d, 0xda, 0x00, 0xc0, 0x4f, 0xd7, 0xba, 0x7c]);
    pub const UDP_IP_GUID: Guid = Guid::from_values(
        0xbf3a50c5, 0xa9c9, 0x4988, [0xa0, 0x05, 0x2d, 0xf0, 0xb7, 0xc8, 0x0f, 0x80]);

    /// Rundown events emitted by the `NT Kernel Logger` when it merges a trace (e.g. image ids)
    pub const KERNEL_TRACE_CONTROL_GUID: Guid = Guid::from_values(
        0xb3e675d7, 0x2554, 0x4f18, [0x83, 0x0b, 0x27, 0x62, 0x73, 0x25, 0x60, 0xde]);
}

static ALL_SCHEMAS: &[&Schema] = &[
    &image_load::IMAGE_LOAD_V1,
    &image_load::IMAGE_LOAD_V3,
    &image_load::IMAGE_UNLOAD_V3,
    &image_load::IMAGE_ID_DBG_ID_RSDS,
    &stack_walk::STACK_WALK,
    &kernel_process::PROCESS_START_V0,
    &kernel_process::PROCESS_START_V1,
    &kernel_process::IMAGE_LOAD_V0,
    &dns_client::DNS_QUERY,
    &dns_client::DNS_QUERY_COMPLETED,
];

/// Every schema of this catalog
pub fn all_schemas() -> &'static [&'static Schema] {
    ALL_SCHEMAS
}
