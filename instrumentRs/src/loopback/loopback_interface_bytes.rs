//! Loopback interface for instrument drivers that send data packages in bytes back and forth.
//!
//! Generally, your instrument driver in this case should implement the reading of the bytes and
//! there is no dedicated "end-of-command" terminator.

use std::collections::VecDeque;

use crate::{InstrumentError, InstrumentInterface, loopback::IncrIndex};

/// A scripted interface for drivers that talk in raw byte packages.
///
/// Every vector in `from_inst` is one reply of the instrument. For [`InstrumentInterface::read_exact`]
/// the replies are one continuous stream of bytes. For [`InstrumentInterface::read_available`],
/// every reply models the bytes delivered by one single receive call: an empty reply is a remote
/// side that closed the connection, and a reply that is longer than the buffer is handed out over
/// multiple calls.
///
/// # Example
///
/// ```
/// use instrumentrs::{InstrumentInterface, LoopbackInterfaceBytes};
///
/// let mut lbk = LoopbackInterfaceBytes::new(vec![b"3GPT".to_vec()], vec![b"01293.15".to_vec()]);
/// lbk.write_raw(b"3GPT").unwrap();
///
/// let mut buf = [0u8; 1024];
/// let n = lbk.read_available(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"01293.15");
/// ```
pub struct LoopbackInterfaceBytes {
    from_host: Vec<Vec<u8>>,
    from_inst: Vec<Vec<u8>>,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    closed: bool,
}

impl LoopbackInterfaceBytes {
    /// Create a new loopback instrument with given commands to and from instrument.
    ///
    /// The main purpose of this interface is to provide a simple loopback interface for testing of
    /// instrument drivers. To do so, you can provide a list of bytes that are expected to go from
    /// the host to the instrument, and a list of bytes that are expected to go from the
    /// instrument to the host. The bytes are read in order. At the end, when the
    /// [`LoopbackInterfaceBytes`] is dropped, a `finalize` function is called that checks if all
    /// bytes that you have provided have been used. If not, a the program panics. During
    /// instrument calls, whenever something is sent to the instrument that is not expected, the
    /// [`LoopbackInterfaceBytes`] will panic as well.
    ///
    /// # Arguments:
    /// * `from_host` - Vector of vectors for command bytes from host to instrument.
    /// * `from_inst` - Vector of vectors for command bytes from instrument to host.
    pub fn new(from_host: Vec<Vec<u8>>, from_inst: Vec<Vec<u8>>) -> Self {
        LoopbackInterfaceBytes {
            from_host,
            from_inst,
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            closed: false,
        }
    }

    /// This command panics if not all commands in the [`LoopbackInterfaceBytes`] have been used.
    ///
    /// It is automatically called when the [`LoopbackInterfaceBytes`] is dropped, but you can also call
    /// it manually to ensure that all commands have been used.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.peek());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.peek());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected commands found from host to instrument: {fil:?}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected commands found from instrument to host: {fil:?}");
        }
        if !self.curr_bytes.is_empty() {
            panic!(
                "Leftover bytes from instrument to host that were never read: {:?}",
                self.curr_bytes
            );
        }
    }

    /// Returns `true` if [`InstrumentInterface::close`] was called on this interface.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Get the next command bytes from host to instrument, or panic.
    fn get_next_from_host(&mut self) -> &Vec<u8> {
        self.from_host
            .get(self.from_host_index.next())
            .expect("No more bytes were expected from host to instrument.")
    }

    /// Get the next bytes from instrument to host, or panic.
    fn get_next_from_inst(&mut self) -> &Vec<u8> {
        self.from_inst
            .get(self.from_inst_index.next())
            .expect("No more bytes were expected from instrument to host.")
    }

    /// Function to read exactly one byte from the next command from the instrument.
    ///
    /// This just panics if there are no more commands. If there are no more commands but one is
    /// required, the panic is justified as this is a test interface.
    fn read_one_byte(&mut self) -> u8 {
        match self.curr_bytes.pop_front() {
            Some(byte) => byte,
            None => {
                let next_cmd = self.get_next_from_inst();
                self.curr_bytes = next_cmd.clone().into();
                self.read_one_byte()
            }
        }
    }

    fn ensure_open(&self) -> Result<(), InstrumentError> {
        if self.closed {
            return Err(InstrumentError::InterfaceClosed);
        }
        Ok(())
    }
}

impl InstrumentInterface for LoopbackInterfaceBytes {
    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        self.ensure_open()?;
        let exp = self.get_next_from_host().as_slice();
        assert_eq!(
            exp,
            cmd,
            "Expected sendcmd '{0:?}', got '{1:?}'",
            std::str::from_utf8(exp),
            std::str::from_utf8(cmd)
        );
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.ensure_open()?;
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, InstrumentError> {
        self.ensure_open()?;
        if self.curr_bytes.is_empty() {
            let next = self.get_next_from_inst().clone();
            self.curr_bytes = next.into();
        }
        let n = buf.len().min(self.curr_bytes.len());
        for (byte, val) in buf.iter_mut().zip(self.curr_bytes.drain(..n)) {
            *byte = val;
        }
        Ok(n)
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        self.closed = true;
        Ok(())
    }
}

impl Drop for LoopbackInterfaceBytes {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}
