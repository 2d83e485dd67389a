use etwschema::native::etw_types::{EventHeader, EventRecord};
use etwschema::provider::image_load::{ImageLoad, IMAGE_LOAD_V3};
use etwschema::provider::stack_walk::{StackWalk, STACK_WALK};
use etwschema::view::EventView;

struct Module {
    name: String,
    base: u64,
    size: u64,
}

fn image_record(base: u64, size: u64, path: &str) -> EventRecord<'static> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&base.to_le_bytes());
    payload.extend_from_slice(&size.to_le_bytes());
    payload.extend_from_slice(&4321u32.to_le_bytes());
    payload.extend_from_slice(&[0; 4 * 3]);
    payload.extend_from_slice(&base.to_le_bytes());
    payload.extend_from_slice(&[0; 4 * 4]);
    for unit in path.encode_utf16().chain(Some(0)) {
        payload.extend_from_slice(&unit.to_le_bytes());
    }
    EventRecord::new(EventHeader::new(*IMAGE_LOAD_V3.descriptor()), payload)
}

fn stack_record(frames: &[u64]) -> EventRecord<'static> {
    let mut payload = 132_854_688_000_000_000u64.to_le_bytes().to_vec();
    payload.extend_from_slice(&4321u32.to_le_bytes());
    payload.extend_from_slice(&1234u32.to_le_bytes());
    for frame in frames {
        payload.extend_from_slice(&frame.to_le_bytes());
    }
    EventRecord::new(EventHeader::new(*STACK_WALK.descriptor()), payload)
}

fn main() {
    env_logger::init(); // this is optional. This makes the (rare) error logs of etwschema to be printed to stderr

    let records = vec![
        image_record(0x7ffb_1c2d_0000, 0x1f_0000, "C:\\Windows\\System32\\ntdll.dll"),
        image_record(0x7ffb_1a00_0000, 0xc_0000, "C:\\Windows\\System32\\kernel32.dll"),
        stack_record(&[0x7ffb_1c2d_4242, 0x7ffb_1a01_0000, 0x0040_1000]),
    ];

    let mut modules = Vec::new();
    for record in &records {
        if let Ok(load) = ImageLoad::new(record) {
            if let (Ok(base), Ok(size), Ok(name)) =
                (load.image_base(), load.image_size(), load.file_name())
            {
                modules.push(Module {
                    name,
                    base: *base,
                    size: *size,
                });
            }
            continue;
        }

        let stack = match StackWalk::new(record) {
            Ok(stack) => stack,
            Err(_) => continue,
        };
        match stack.stack() {
            Ok(frames) => {
                println!(
                    "Stack of thread {} ({} frames):",
                    stack.stack_thread().unwrap_or_default(),
                    frames.len()
                );
                for frame in frames {
                    match modules
                        .iter()
                        .find(|m| frame >= m.base && frame - m.base < m.size)
                    {
                        Some(m) => println!("    {}+{:#x}", m.name, frame - m.base),
                        None => println!("    {:#x}", frame),
                    }
                }
            }
            Err(err) => println!("Error: {} getting Stack", err),
        }
    }
}
