use etwschema::native::etw_types::{EventDescriptor, EventHeader, EventRecord, PointerSize};
use etwschema::Guid;

/// Lays out event payloads the way providers do: fields back to back, little-endian, no padding
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    pointer_size: PointerSize,
    bytes: Vec<u8>,
}

#[allow(dead_code)] // not every test binary uses every helper
impl PayloadBuilder {
    pub fn new(pointer_size: PointerSize) -> Self {
        Self {
            pointer_size,
            bytes: Vec::new(),
        }
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.bytes.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(mut self, v: i64) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Truncated to 32 bits for 32-bit processes
    pub fn pointer(self, v: u64) -> Self {
        match self.pointer_size {
            PointerSize::Bits32 => self.u32(v as u32),
            PointerSize::Bits64 => self.u64(v),
        }
    }

    pub fn pointers(self, values: &[u64]) -> Self {
        values.iter().fold(self, |b, v| b.pointer(*v))
    }

    /// NUL-terminated UTF-16
    pub fn utf16(mut self, s: &str) -> Self {
        for unit in s.encode_utf16().chain(Some(0)) {
            self.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        self
    }

    /// NUL-terminated 8-bit string
    pub fn ansi(mut self, s: &str) -> Self {
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        self
    }

    pub fn guid(mut self, guid: Guid) -> Self {
        self.bytes.extend_from_slice(&guid.to_bytes_le());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// A record carrying this payload, with the identity of `descriptor`
    pub fn record(self, descriptor: &EventDescriptor) -> EventRecord<'static> {
        let header = EventHeader::new(*descriptor).pointer_size(self.pointer_size);
        EventRecord::new(header, self.bytes)
    }
}
