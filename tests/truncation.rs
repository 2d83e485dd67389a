//! Truncated and garbage payloads must fail field by field, never panic
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use etwschema::native::etw_types::{EventHeader, EventRecord, PointerSize};
use etwschema::parser::Parser;
use etwschema::provider::{all_schemas, image_load, kernel_process, stack_walk};
use etwschema::schema::Schema;

mod utils;
use utils::PayloadBuilder;

/// Every prefix of a valid payload decodes the fields it fully contains exactly like the whole payload does
fn check_prefixes(schema: &'static Schema, payload: PayloadBuilder) {
    let full = payload.record(schema.descriptor());
    let full_parser = Parser::create(&full, schema).unwrap();
    for (name, value) in full_parser.values() {
        assert!(value.is_ok(), "{}: {} does not decode", schema.name(), name);
    }

    let len = full.user_buffer().len();
    for cut in 0..=len {
        let truncated = EventRecord::new(*full.header(), &full.user_buffer()[..cut]);
        let parser = Parser::create(&truncated, schema).unwrap();

        for (index, field) in schema.fields().iter().enumerate() {
            let value = parser.value_at(index);
            let span = full_parser.field_span(index).unwrap();

            if field.kind.is_trailing() {
                continue;
            }
            if span.end() <= cut {
                assert_eq!(value, full_parser.value_at(index), "{} cut at {}", field.name, cut);
            } else {
                assert!(value.is_err(), "{} cut at {}", field.name, cut);
            }
        }
    }
}

#[test]
fn image_load_prefixes() {
    for pointer_size in [PointerSize::Bits32, PointerSize::Bits64] {
        let payload = PayloadBuilder::new(pointer_size)
            .pointer(0x7ffb_1c2d_0000)
            .pointer(0x0001_f000)
            .u32(4321)
            .u32(1)
            .u32(2)
            .u32(0)
            .pointer(0x1_8000_0000)
            .u32(0)
            .u32(0)
            .u32(0)
            .u32(0)
            .utf16("C:\\Windows\\System32\\ntdll.dll");
        check_prefixes(&image_load::IMAGE_LOAD_V3, payload);
    }
}

#[test]
fn process_start_prefixes() {
    let payload = PayloadBuilder::new(PointerSize::Bits64)
        .u32(9001)
        .i64(132_854_688_000_000_000)
        .u32(800)
        .u32(1)
        .u32(0)
        .utf16("calc.exe")
        .u32(3)
        .u32(4)
        .utf16("")
        .utf16("App");
    check_prefixes(&kernel_process::PROCESS_START_V1, payload);
}

#[test]
fn stack_walk_prefixes() {
    let payload = PayloadBuilder::new(PointerSize::Bits64)
        .u64(1)
        .u32(2)
        .u32(3)
        .pointers(&[0xffff_f807_0000_1000, 0x7ffb_0000_2000]);
    check_prefixes(&stack_walk::STACK_WALK, payload);
}

#[test]
fn random_payloads() {
    let mut rng = StdRng::seed_from_u64(0x00e7_5c4e_aa00);

    for _ in 0..500 {
        let len = rng.gen_range(0..96);
        let mut payload = vec![0u8; len];
        rng.fill(&mut payload[..]);
        // Make NULs common enough for strings to terminate once in a while
        for byte in payload.iter_mut() {
            if rng.gen_bool(0.2) {
                *byte = 0;
            }
        }

        let pointer_size = if rng.gen() {
            PointerSize::Bits32
        } else {
            PointerSize::Bits64
        };

        for schema in all_schemas() {
            let header = EventHeader::new(*schema.descriptor()).pointer_size(pointer_size);
            let record = EventRecord::new(header, &payload[..]);
            let parser = Parser::create(&record, schema).unwrap();

            // Reverse order first, then forward order against a fresh parser
            let backward: Vec<_> = (0..schema.property_count())
                .rev()
                .map(|i| parser.value_at(i))
                .collect();
            let fresh = Parser::create(&record, schema).unwrap();
            let forward: Vec<_> = fresh.values().map(|(_, v)| v).collect();

            assert_eq!(backward.into_iter().rev().collect::<Vec<_>>(), forward);
        }
    }
}
