//! Kernel image load events
//!
//! Emitted by the `NT Kernel Logger` when the `IMAGE_LOAD` flag is set, see
//! [Image_Load](https://learn.microsoft.com/en-us/windows/win32/etw/image-load).
use crate::native::etw_types::{EventDescriptor, Level};
use crate::parser::Pointer;
use crate::provider::kernel_guids::{IMAGE_LOAD_GUID, KERNEL_TRACE_CONTROL_GUID};
use crate::schema::FieldKind;
use crate::Guid;

pub const OPCODE_UNLOAD: u8 = 2;
pub const OPCODE_LOAD: u8 = 10;
pub const OPCODE_DBG_ID_RSDS: u8 = 36;

crate::event_view! {
    /// An image (exe or dll) was mapped into a process, as logged by Windows XP and 2003
    pub struct ImageLoadV1 => IMAGE_LOAD_V1 {
        name: "Image/Load v1",
        descriptor: EventDescriptor::new(IMAGE_LOAD_GUID, 0, 1).with_opcode(OPCODE_LOAD),
        fields: {
            image_base: Pointer = ("ImageBase", FieldKind::Pointer),
            image_size: Pointer = ("ImageSize", FieldKind::Pointer),
            process_id: u32 = ("ProcessId", FieldKind::UInt32),
            file_name: String = ("FileName", FieldKind::UnicodeString),
        }
    }
}

crate::event_view! {
    /// An image (exe or dll) was mapped into a process
    pub struct ImageLoad => IMAGE_LOAD_V3 {
        name: "Image/Load",
        descriptor: EventDescriptor::new(IMAGE_LOAD_GUID, 0, 3).with_opcode(OPCODE_LOAD),
        fields: {
            image_base: Pointer = ("ImageBase", FieldKind::Pointer),
            image_size: Pointer = ("ImageSize", FieldKind::Pointer),
            process_id: u32 = ("ProcessId", FieldKind::UInt32),
            image_checksum: u32 = ("ImageCheckSum", FieldKind::UInt32),
            time_date_stamp: u32 = ("TimeDateStamp", FieldKind::UInt32),
            reserved0: u32 = ("Reserved0", FieldKind::UInt32),
            /// Preferred base address, from the PE header
            default_base: Pointer = ("DefaultBase", FieldKind::Pointer),
            reserved1: u32 = ("Reserved1", FieldKind::UInt32),
            reserved2: u32 = ("Reserved2", FieldKind::UInt32),
            reserved3: u32 = ("Reserved3", FieldKind::UInt32),
            reserved4: u32 = ("Reserved4", FieldKind::UInt32),
            /// NT path of the image, e.g. `\Device\HarddiskVolume3\Windows\System32\ntdll.dll`
            file_name: String = ("FileName", FieldKind::UnicodeString),
        }
    }
}

crate::event_view! {
    /// An image was unmapped from a process
    pub struct ImageUnload => IMAGE_UNLOAD_V3 {
        name: "Image/UnLoad",
        descriptor: EventDescriptor::new(IMAGE_LOAD_GUID, 0, 3).with_opcode(OPCODE_UNLOAD),
        fields: {
            image_base: Pointer = ("ImageBase", FieldKind::Pointer),
            image_size: Pointer = ("ImageSize", FieldKind::Pointer),
            process_id: u32 = ("ProcessId", FieldKind::UInt32),
            image_checksum: u32 = ("ImageCheckSum", FieldKind::UInt32),
            time_date_stamp: u32 = ("TimeDateStamp", FieldKind::UInt32),
            reserved0: u32 = ("Reserved0", FieldKind::UInt32),
            default_base: Pointer = ("DefaultBase", FieldKind::Pointer),
            reserved1: u32 = ("Reserved1", FieldKind::UInt32),
            reserved2: u32 = ("Reserved2", FieldKind::UInt32),
            reserved3: u32 = ("Reserved3", FieldKind::UInt32),
            reserved4: u32 = ("Reserved4", FieldKind::UInt32),
            file_name: String = ("FileName", FieldKind::UnicodeString),
        }
    }
}

crate::event_view! {
    /// CodeView (RSDS) debug info of a loaded image: what a symbol server needs to find its pdb
    pub struct ImageIdDbgIdRsds => IMAGE_ID_DBG_ID_RSDS {
        name: "ImageId/DbgID_RSDS",
        descriptor: EventDescriptor::new(KERNEL_TRACE_CONTROL_GUID, 0, 2)
            .with_opcode(OPCODE_DBG_ID_RSDS)
            .with_level(Level::Information),
        fields: {
            image_base: Pointer = ("ImageBase", FieldKind::Pointer),
            process_id: u32 = ("ProcessId", FieldKind::UInt32),
            guid_sig: Guid = ("GuidSig", FieldKind::Guid),
            age: u32 = ("Age", FieldKind::UInt32),
            pdb_file_name: String = ("PdbFileName", FieldKind::TrailingAnsiString),
        }
    }
}

impl ImageLoad<'_> {
    /// Whether `address` falls within the mapped image
    pub fn contains(&self, address: u64) -> bool {
        match (self.image_base(), self.image_size()) {
            (Ok(base), Ok(size)) => address >= *base && address - *base < *size,
            _ => false,
        }
    }
}

impl ImageIdDbgIdRsds<'_> {
    /// The key symbol servers index pdbs with: the signature GUID (uppercase, no hyphens)
    /// followed by the age in hex
    pub fn symbol_key(&self) -> crate::parser::ParserResult<String> {
        let guid = self.guid_sig()?;
        let age = self.age()?;
        Ok(format!(
            "{}{:x}",
            guid.to_string().replace('-', "").to_uppercase(),
            age
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::etw_types::{EventHeader, EventRecord};
    use crate::view::EventView;

    #[test]
    fn test_rsds() {
        let guid = Guid::from_u128(0x1a2b3c4d_5e6f_7081_92a3_b4c5d6e7f809);
        let mut payload = 0x7ff6_0000_0000u64.to_le_bytes().to_vec();
        payload.extend_from_slice(&42u32.to_le_bytes());
        payload.extend_from_slice(&guid.to_bytes_le());
        payload.extend_from_slice(&3u32.to_le_bytes());
        payload.extend_from_slice(b"C:\\build\\app.pdb\0");

        let header = EventHeader::new(*IMAGE_ID_DBG_ID_RSDS.descriptor());
        let record = EventRecord::new(header, payload);
        let rsds = ImageIdDbgIdRsds::new(&record).unwrap();

        assert_eq!(*rsds.image_base().unwrap(), 0x7ff6_0000_0000);
        assert_eq!(rsds.process_id().unwrap(), 42);
        assert_eq!(rsds.guid_sig().unwrap(), guid);
        assert_eq!(rsds.pdb_file_name().unwrap(), "C:\\build\\app.pdb");
        assert_eq!(
            rsds.symbol_key().unwrap(),
            "1A2B3C4D5E6F708192A3B4C5D6E7F8093"
        );
    }

    #[test]
    fn test_load_and_unload_differ_by_opcode() {
        assert_eq!(IMAGE_LOAD_V3.fields(), IMAGE_UNLOAD_V3.fields());
        assert_ne!(IMAGE_LOAD_V3.key(), IMAGE_UNLOAD_V3.key());
    }
}
