#![cfg(feature = "serde")]

use etwschema::native::etw_types::{CpuTime, EventHeader, EventRecord, PointerSize};
use etwschema::provider::{image_load, stack_walk};
use etwschema::schema_locator::SchemaLocator;
use etwschema::{EventSerializer, EventSerializerOptions};

mod utils;
use utils::PayloadBuilder;

fn image_load_record() -> EventRecord<'static> {
    let payload = PayloadBuilder::new(PointerSize::Bits32)
        .pointer(0x7700_0000)
        .pointer(0x0018_0000)
        .u32(4321)
        .u32(0x0019_1c4e)
        .u32(0x5e7a_1b2c)
        .u32(0)
        .pointer(0x7700_0000)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .utf16("\\Device\\HarddiskVolume3\\Windows\\SysWOW64\\ntdll.dll")
        .build();

    let header = EventHeader::new(*image_load::IMAGE_LOAD_V3.descriptor())
        .pointer_size(PointerSize::Bits32)
        .process_id(4321)
        .thread_id(1234)
        .timestamp(132_854_688_000_000_000)
        .cpu_time(CpuTime::KernelUser {
            kernel_time: 3,
            user_time: 5,
        });
    EventRecord::new(header, payload)
}

#[test]
fn json() {
    let record = image_load_record();
    let parser = SchemaLocator::builtin().parser(&record).unwrap();
    let json = serde_json::to_value(EventSerializer::from_parser(&parser, Default::default())).unwrap();

    assert_eq!(json["Schema"]["Name"], "Image/Load");
    assert_eq!(json["Schema"]["Descriptor"]["Version"], 3);
    assert_eq!(json["Schema"]["Descriptor"]["Opcode"], 10);

    let header = &json["Header"];
    assert_eq!(header["ProcessId"], 4321);
    assert_eq!(header["ThreadId"], 1234);
    assert_eq!(header["PointerSize"], 4);
    assert_eq!(header["KernelTime"], 3);
    assert_eq!(header["UserTime"], 5);
    assert!(header.get("ProcessorTime").is_none());

    let event = &json["Event"];
    assert_eq!(event["ImageBase"], 0x7700_0000);
    assert_eq!(event["ProcessId"], 4321);
    assert_eq!(
        event["FileName"],
        "\\Device\\HarddiskVolume3\\Windows\\SysWOW64\\ntdll.dll"
    );
    assert_eq!(event.as_object().unwrap().len(), 12);
}

#[test]
fn json_event_only() {
    let payload = PayloadBuilder::new(PointerSize::Bits64)
        .u64(42)
        .u32(4)
        .u32(8)
        .pointers(&[0xffff_f807_0000_1000])
        .build();
    let header = EventHeader::new(*stack_walk::STACK_WALK.descriptor());
    let record = EventRecord::new(header, payload);
    let parser = SchemaLocator::builtin().parser(&record).unwrap();

    let options = EventSerializerOptions {
        include_schema: false,
        include_header: false,
        ..Default::default()
    };
    let json = serde_json::to_string(&EventSerializer::from_parser(&parser, options)).unwrap();
    assert_eq!(
        json,
        r#"{"Event":{"EventTimeStamp":42,"StackProcess":4,"StackThread":8,"Stack":[18446735307681304576]}}"#
    );
}

#[test]
fn flexbuffers() {
    let record = image_load_record();
    let parser = SchemaLocator::builtin().parser(&record).unwrap();
    let ser = EventSerializer::from_parser(&parser, Default::default());
    let bytes = flexbuffers::to_vec(ser).unwrap();

    let root = flexbuffers::Reader::get_root(bytes.as_slice()).unwrap();
    let event = root.as_map().idx("Event").as_map();
    assert_eq!(event.idx("ProcessId").as_u32(), 4321);
    assert_eq!(event.idx("ImageBase").as_u64(), 0x7700_0000);
    assert_eq!(
        event.idx("FileName").as_str(),
        "\\Device\\HarddiskVolume3\\Windows\\SysWOW64\\ntdll.dll"
    );
}
