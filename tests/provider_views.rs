//! The builtin event views, on payloads shaped like the ones Windows emits
use etwschema::native::etw_types::{EventDescriptor, PointerSize};
use etwschema::parser::ParserError;
use etwschema::provider::{dns_client, image_load, kernel_guids, kernel_process, stack_walk};
use etwschema::schema_locator::{SchemaError, SchemaLocator};
use etwschema::view::EventView;

mod utils;
use utils::PayloadBuilder;

fn image_load_payload(pointer_size: PointerSize, file_name: &str) -> PayloadBuilder {
    PayloadBuilder::new(pointer_size)
        .pointer(0x7ffb_1c2d_0000)
        .pointer(0x0001_f000)
        .u32(4321)
        .u32(0x0002_0a3c)
        .u32(0x5e7a_1b2c)
        .u32(0)
        .pointer(0x1_8000_0000)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .utf16(file_name)
}

#[test]
fn image_load_64() {
    let record = image_load_payload(
        PointerSize::Bits64,
        "\\Device\\HarddiskVolume3\\Windows\\System32\\ntdll.dll",
    )
    .record(image_load::IMAGE_LOAD_V3.descriptor());

    assert!(image_load::ImageLoad::matches(&record));
    assert!(!image_load::ImageUnload::matches(&record));

    let load = image_load::ImageLoad::new(&record).unwrap();
    assert_eq!(*load.image_base().unwrap(), 0x7ffb_1c2d_0000);
    assert_eq!(*load.image_size().unwrap(), 0x0001_f000);
    assert_eq!(load.process_id().unwrap(), 4321);
    assert_eq!(load.time_date_stamp().unwrap(), 0x5e7a_1b2c);
    assert_eq!(*load.default_base().unwrap(), 0x1_8000_0000);
    assert_eq!(
        load.file_name().unwrap(),
        "\\Device\\HarddiskVolume3\\Windows\\System32\\ntdll.dll"
    );

    assert!(load.contains(0x7ffb_1c2d_1234));
    assert!(!load.contains(0x7ffb_1c2d_0000 + 0x0001_f000));
    assert!(!load.contains(0x1000));
}

#[test]
fn image_load_32() {
    let record = image_load_payload(PointerSize::Bits32, "C:\\app\\app.exe")
        .record(image_load::IMAGE_LOAD_V3.descriptor());

    let load = image_load::ImageLoad::new(&record).unwrap();
    // Pointers were truncated to 32 bits by the builder
    assert_eq!(*load.image_base().unwrap(), 0x1c2d_0000);
    assert_eq!(load.process_id().unwrap(), 4321);
    assert_eq!(*load.default_base().unwrap(), 0x8000_0000);
    assert_eq!(load.file_name().unwrap(), "C:\\app\\app.exe");
}

#[test]
fn stack_walk() {
    let frames = [
        0xffff_f807_1234_5678,
        0xffff_f807_1234_0000,
        0x0000_7ffb_1c2d_4321,
    ];
    let record = PayloadBuilder::new(PointerSize::Bits64)
        .u64(132_854_688_000_000_000)
        .u32(4321)
        .u32(1234)
        .pointers(&frames)
        .record(stack_walk::STACK_WALK.descriptor());

    let stack = stack_walk::StackWalk::new(&record).unwrap();
    assert_eq!(stack.event_timestamp().unwrap(), 132_854_688_000_000_000);
    assert_eq!(stack.stack_process().unwrap(), 4321);
    assert_eq!(stack.stack_thread().unwrap(), 1234);
    assert_eq!(stack.depth().unwrap(), 3);
    assert_eq!(stack.stack().unwrap().to_vec(), frames);
}

#[test]
fn stack_walk_with_a_partial_frame() {
    let record = PayloadBuilder::new(PointerSize::Bits32)
        .u64(1)
        .u32(2)
        .u32(3)
        .pointers(&[0x1000, 0x2000])
        .raw(&[0xff, 0xff])
        .record(stack_walk::STACK_WALK.descriptor());

    let stack = stack_walk::StackWalk::new(&record).unwrap();
    assert_eq!(stack.stack_thread().unwrap(), 3);
    assert_eq!(
        stack.stack(),
        Err(ParserError::MisalignedArray {
            len: 10,
            element_size: 4
        })
    );
}

#[test]
fn image_rsds() {
    let guid = etwschema::Guid::from_u128(0x6c1a5ff9_c6ff_4d83_8bd1_f0a1e9a3b7c2);
    let record = PayloadBuilder::new(PointerSize::Bits64)
        .pointer(0x7ffb_1c2d_0000)
        .u32(4321)
        .guid(guid)
        .u32(1)
        .raw(b"ntdll.pdb")
        .record(image_load::IMAGE_ID_DBG_ID_RSDS.descriptor());

    let rsds = image_load::ImageIdDbgIdRsds::new(&record).unwrap();
    assert_eq!(rsds.guid_sig().unwrap(), guid);
    assert_eq!(rsds.pdb_file_name().unwrap(), "ntdll.pdb");
    assert_eq!(
        rsds.symbol_key().unwrap(),
        "6C1A5FF9C6FF4D838BD1F0A1E9A3B7C21"
    );
}

fn process_start_v0() -> PayloadBuilder {
    PayloadBuilder::new(PointerSize::Bits64)
        .u32(9000)
        .i64(132_854_688_000_000_000)
        .u32(800)
        .u32(1)
        .utf16("\\Device\\HarddiskVolume3\\Windows\\notepad.exe")
}

#[test]
fn process_start_versions() {
    let v0 = process_start_v0().record(kernel_process::PROCESS_START_V0.descriptor());
    let v1 = PayloadBuilder::new(PointerSize::Bits64)
        .u32(9001)
        .i64(132_854_688_000_000_000)
        .u32(800)
        .u32(1)
        .u32(0)
        .utf16("\\Device\\HarddiskVolume3\\Program Files\\WindowsApps\\calc.exe")
        .u32(0x000a_1b2c)
        .u32(0x5e7a_1b2c)
        .utf16("Microsoft.WindowsCalculator_11.2210.0.0_x64__8wekyb3d8bbwe")
        .utf16("App")
        .record(kernel_process::PROCESS_START_V1.descriptor());

    let start = kernel_process::AnyProcessStart::new(&v0).unwrap();
    assert!(matches!(start, kernel_process::AnyProcessStart::V0(_)));
    assert_eq!(start.process_id().unwrap(), 9000);
    assert_eq!(start.parent_process_id().unwrap(), 800);
    assert_eq!(start.create_time().unwrap().as_unix_timestamp(), 1_640_995_200_000);
    assert_eq!(start.package_full_name(), Err(ParserError::NotFound));

    let start = kernel_process::AnyProcessStart::new(&v1).unwrap();
    assert!(matches!(start, kernel_process::AnyProcessStart::V1(_)));
    assert_eq!(start.process_id().unwrap(), 9001);
    assert_eq!(
        start.image_name().unwrap(),
        "\\Device\\HarddiskVolume3\\Program Files\\WindowsApps\\calc.exe"
    );
    assert_eq!(
        start.package_full_name().unwrap(),
        "Microsoft.WindowsCalculator_11.2210.0.0_x64__8wekyb3d8bbwe"
    );

    // A v1 view must not decode a v0 record
    assert!(matches!(
        kernel_process::ProcessStartV1::new(&v0),
        Err(ParserError::SchemaMismatch { .. })
    ));
}

#[test]
fn dns_query_completed() {
    let record = PayloadBuilder::new(PointerSize::Bits64)
        .utf16("example.com")
        .u32(28)
        .u64(0x4000_0000_6000)
        .u32(0)
        .utf16("::ffff:93.184.216.34;2606:2800:220:1:248:1893:25c8:1946;")
        .record(dns_client::DNS_QUERY_COMPLETED.descriptor());

    let completed = dns_client::DnsQueryCompleted::new(&record).unwrap();
    assert_eq!(completed.query_name().unwrap(), "example.com");
    assert_eq!(completed.query_type().unwrap(), 28);
    assert_eq!(completed.query_status().unwrap(), 0);
    assert_eq!(
        completed.results().unwrap(),
        ["::ffff:93.184.216.34", "2606:2800:220:1:248:1893:25c8:1946"]
    );
}

#[test]
fn locator_routes_records() {
    let locator = SchemaLocator::builtin();

    let record = process_start_v0().record(kernel_process::PROCESS_START_V0.descriptor());
    let schema = locator.event_schema(&record).unwrap();
    assert_eq!(schema.name(), kernel_process::PROCESS_START_V0.name());

    let parser = locator.parser(&record).unwrap();
    assert_eq!(parser.try_parse::<u32>("ProcessID"), Ok(9000));

    let unknown = EventDescriptor::new(kernel_guids::TCP_IP_GUID, 0, 2).with_opcode(10);
    let record = process_start_v0().record(&unknown);
    assert!(matches!(
        locator.event_schema(&record),
        Err(SchemaError::Unknown(_))
    ));
}

#[test]
fn builtin_schemas_are_well_formed() {
    let locator = SchemaLocator::builtin();
    assert_eq!(locator.len(), etwschema::provider::all_schemas().len());
    for schema in locator.schemas() {
        assert!(schema.is_well_formed(), "{} is malformed", schema.name());
    }
}
