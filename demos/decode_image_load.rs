use etwschema::native::etw_types::{EventHeader, EventRecord, PointerSize};
use etwschema::provider::image_load::{self, ImageLoad};
use etwschema::provider::kernel_process::{self, AnyProcessStart};
use etwschema::schema_locator::SchemaLocator;
use etwschema::view::EventView;

/// Records as a real-time session or an .etl file would deliver them
fn captured_records() -> Vec<EventRecord<'static>> {
    let mut image = Vec::new();
    image.extend_from_slice(&0x7ffb_1c2d_0000u64.to_le_bytes());
    image.extend_from_slice(&0x0001_f000u64.to_le_bytes());
    image.extend_from_slice(&4321u32.to_le_bytes());
    image.extend_from_slice(&[0; 4 * 3]);
    image.extend_from_slice(&0x1_8000_0000u64.to_le_bytes());
    image.extend_from_slice(&[0; 4 * 4]);
    push_utf16(&mut image, "\\Device\\HarddiskVolume3\\Windows\\System32\\ntdll.dll");

    let mut process = Vec::new();
    process.extend_from_slice(&4321u32.to_le_bytes());
    process.extend_from_slice(&132_854_688_000_000_000i64.to_le_bytes());
    process.extend_from_slice(&800u32.to_le_bytes());
    process.extend_from_slice(&1u32.to_le_bytes());
    push_utf16(&mut process, "\\Device\\HarddiskVolume3\\Windows\\notepad.exe");

    // Cut short: only the first fields can be decoded
    let truncated = image[..20].to_vec();

    vec![
        EventRecord::new(
            EventHeader::new(*kernel_process::PROCESS_START_V0.descriptor()).process_id(800),
            process,
        ),
        EventRecord::new(
            EventHeader::new(*image_load::IMAGE_LOAD_V3.descriptor()).process_id(4321),
            image,
        ),
        EventRecord::new(
            EventHeader::new(*image_load::IMAGE_LOAD_V3.descriptor())
                .process_id(4321)
                .pointer_size(PointerSize::Bits64),
            truncated,
        ),
    ]
}

fn push_utf16(buffer: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16().chain(Some(0)) {
        buffer.extend_from_slice(&unit.to_le_bytes());
    }
}

fn main() {
    env_logger::init(); // this is optional. This makes the (rare) error logs of etwschema to be printed to stderr

    let image_load_callback = |record: &EventRecord| {
        if let Ok(load) = ImageLoad::new(record) {
            match load.file_name() {
                Ok(file_name) => println!(
                    "ImageLoad: PID {} base {:#x} FileName {}",
                    load.process_id().unwrap_or_default(),
                    load.image_base().unwrap_or_default(),
                    file_name
                ),
                Err(err) => println!("Error: {} getting FileName", err),
            }
        }
    };

    let process_callback = |record: &EventRecord| {
        if let Ok(start) = AnyProcessStart::new(record) {
            match start.image_name() {
                Ok(image_name) => println!(
                    "ProcessStart: PID {} ImageName {}",
                    start.process_id().unwrap_or_default(),
                    image_name
                ),
                Err(err) => println!("Error: {} getting ImageName", err),
            }
        }
    };

    let dump_callback = |record: &EventRecord| match SchemaLocator::builtin().parser(record) {
        Ok(parser) => {
            println!("{}:", parser.schema().name());
            for (name, value) in parser.values() {
                match value {
                    Ok(value) => println!("    {}: {:?}", name, value),
                    Err(err) => println!("    {}: <{}>", name, err),
                }
            }
        }
        Err(err) => println!("Error {}", err),
    };

    for record in captured_records() {
        image_load_callback(&record);
        process_callback(&record);
        dump_callback(&record);
    }
}
