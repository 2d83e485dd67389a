//! Abstraction layer for native types
//!
//! Portable models of the Windows structures that come with an ETW event. The `win32` module
//! converts from the real Windows structures, and is only available on Windows.
pub mod etw_types;
pub mod guid;
pub mod time;

#[cfg(windows)]
pub mod win32;
