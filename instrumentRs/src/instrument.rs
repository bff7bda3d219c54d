//! This module provides the main implementation for the Instrument Interface trait.
//!
//! It can be called with any type that implements [`std::io::Read`] and [`std::io::Write`],
//! such as [`std::net::TcpStream`].

use std::{
    io::{ErrorKind, Read, Write},
    time::Duration,
};

use tracing::{debug, trace};

use crate::{InstrumentError, InstrumentInterface};

/// A general instrument interface that can be built with any interface that implements
/// [`std::io::Read`] and [`std::io::Write`].
///
/// The [`Instrument`] owns its port. The port is released when [`InstrumentInterface::close`] is
/// called or, at the latest, when the [`Instrument`] is dropped. After closing, every read or
/// write returns [`InstrumentError::InterfaceClosed`].
///
/// # Example
///
/// The following shows a simple example on how to create an [`Instrument`] interface from your own
/// interface that implements [`std::io::Read`] and [`std::io::Write`]. Of course, to just use a
/// simple [`std::net::TcpStream`] as shown here, you can also use the
/// [`crate::TcpIpInterface`] interface.
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use instrumentrs::Instrument;
///
/// let my_interface = TcpStream::connect("192.168.10.1:8000").unwrap();
/// let inst_interface = Instrument::new(my_interface, Duration::from_secs(3));
/// ```
pub struct Instrument<P: Read + Write> {
    port: Option<P>,
    terminator: String,
    timeout: Duration,
}

impl<P: Read + Write> Instrument<P> {
    /// Create a new instance of [`Instrument`] with a given port and timeout.
    ///
    /// The timeout is what the instrument reports to drivers and what is used when reading until
    /// a terminator. If your port supports native timeouts (like [`std::net::TcpStream`]), set
    /// them on the port as well.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port: Some(port),
            terminator: "\n".to_string(),
            timeout,
        }
    }

    /// Returns `true` as long as the port has not been closed.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port_mut(&mut self) -> Result<&mut P, InstrumentError> {
        self.port.as_mut().ok_or(InstrumentError::InterfaceClosed)
    }

    /// Turn an I/O error of the port into an [`InstrumentError`].
    ///
    /// Blocking sockets report an elapsed read timeout as `WouldBlock` (Unix) or `TimedOut`
    /// (Windows).
    fn map_io_error(&self, err: std::io::Error) -> InstrumentError {
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => InstrumentError::Timeout(self.timeout),
            _ => InstrumentError::Io(err),
        }
    }
}

impl<P: Read + Write> InstrumentInterface for Instrument<P> {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        let port = self.port_mut()?;
        let res = port.write_all(data).and_then(|_| port.flush());
        res.map_err(|e| self.map_io_error(e))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        let res = self.port_mut()?.read_exact(buf);
        res.map_err(|e| self.map_io_error(e))
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, InstrumentError> {
        loop {
            let res = self.port_mut()?.read(buf);
            match res {
                Ok(n) => {
                    trace!(bytes = ?&buf[..n], "received");
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.map_io_error(err)),
            }
        }
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        if self.port.take().is_some() {
            debug!("Instrument port closed");
        }
        Ok(())
    }
}
