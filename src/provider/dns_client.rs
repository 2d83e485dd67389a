//! Microsoft-Windows-DNS-Client
use crate::native::etw_types::{EventDescriptor, Level};
use crate::native::guid::Guid;
use crate::schema::FieldKind;

pub const PROVIDER_GUID: Guid = Guid::from_values(
    0x1c95126e, 0x7eea, 0x49a9, [0xa3, 0xfe, 0xa3, 0x78, 0xb0, 0x3d, 0xdb, 0x4d]);

pub const EVENT_QUERY: u16 = 3006;
pub const EVENT_QUERY_COMPLETED: u16 = 3008;

crate::event_view! {
    /// A name resolution was requested
    pub struct DnsQuery => DNS_QUERY {
        name: "DNS-Client/Query",
        descriptor: EventDescriptor::new(PROVIDER_GUID, EVENT_QUERY, 0)
            .with_level(Level::Information),
        fields: {
            query_name: String = ("QueryName", FieldKind::UnicodeString),
            /// DNS record type, e.g. 1 for `A` or 28 for `AAAA`
            query_type: u32 = ("QueryType", FieldKind::UInt32),
            query_options: u64 = ("QueryOptions", FieldKind::UInt64),
            server_list: String = ("ServerList", FieldKind::UnicodeString),
            is_network_query: u32 = ("IsNetworkQuery", FieldKind::UInt32),
            network_query_index: u32 = ("NetworkQueryIndex", FieldKind::UInt32),
            interface_index: u32 = ("InterfaceIndex", FieldKind::UInt32),
            is_async_query: u32 = ("IsAsyncQuery", FieldKind::UInt32),
        }
    }
}

crate::event_view! {
    /// A name resolution completed
    pub struct DnsQueryCompleted => DNS_QUERY_COMPLETED {
        name: "DNS-Client/QueryCompleted",
        descriptor: EventDescriptor::new(PROVIDER_GUID, EVENT_QUERY_COMPLETED, 0)
            .with_level(Level::Information),
        fields: {
            query_name: String = ("QueryName", FieldKind::UnicodeString),
            query_type: u32 = ("QueryType", FieldKind::UInt32),
            query_options: u64 = ("QueryOptions", FieldKind::UInt64),
            /// 0 on success, a Win32 error code otherwise
            query_status: u32 = ("QueryStatus", FieldKind::UInt32),
            /// Semicolon-separated answers, e.g. `::ffff:93.184.216.34;`
            query_results: String = ("QueryResults", FieldKind::UnicodeString),
        }
    }
}

impl DnsQueryCompleted<'_> {
    /// The individual answers of `QueryResults`
    pub fn results(&self) -> crate::parser::ParserResult<Vec<String>> {
        let results = self.query_results()?;
        Ok(results
            .split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect())
    }
}
