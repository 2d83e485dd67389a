//! Kernel stack walk events
//!
//! When stack tracing is enabled for some kernel events, each of them is followed by a
//! [StackWalk_Event](https://learn.microsoft.com/en-us/windows/win32/etw/stackwalk-event) holding
//! the call stack of the thread that emitted it. `EventTimeStamp` is the timestamp of that event.
use crate::native::etw_types::EventDescriptor;
use crate::parser::AddressList;
use crate::provider::kernel_guids::STACK_WALK_GUID;
use crate::schema::FieldKind;

pub const OPCODE_STACK: u8 = 32;

crate::event_view! {
    /// A call stack, innermost frame first
    pub struct StackWalk => STACK_WALK {
        name: "StackWalk/Stack",
        descriptor: EventDescriptor::new(STACK_WALK_GUID, 0, 2).with_opcode(OPCODE_STACK),
        fields: {
            event_timestamp: u64 = ("EventTimeStamp", FieldKind::UInt64),
            stack_process: u32 = ("StackProcess", FieldKind::UInt32),
            stack_thread: u32 = ("StackThread", FieldKind::UInt32),
            stack: AddressList<'_> = ("Stack", FieldKind::AddressList),
        }
    }
}

impl StackWalk<'_> {
    /// Number of frames, without decoding them
    pub fn depth(&self) -> crate::parser::ParserResult<usize> {
        self.stack().map(|stack| stack.len())
    }
}
