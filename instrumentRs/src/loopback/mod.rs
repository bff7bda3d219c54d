//! The loopback module provides instrument simulators for testing purposes.
//!
//! The [`LoopbackInterfaceString`] allows to test instruments drivers that communicate using
//! strings (which are then encoded as bytes of course) and have a fixed terminator to declare the
//! end of a line. The [`LoopbackInterfaceBytes`] is meant for drivers that build their own
//! packages of bytes, e.g., length-prefixed frames.
//!
//! Both interfaces are scripted: you hand them what you expect the host to send and what the
//! instrument should reply, in order. Any deviation panics, and so does leftover traffic when the
//! interface is dropped.

mod loopback_interface_bytes;
mod loopback_interface_string;

pub use loopback_interface_bytes::*;
pub use loopback_interface_string::*;

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }

    /// Index that `next` would return, without incrementing.
    fn peek(&self) -> usize {
        self.index
    }
}
