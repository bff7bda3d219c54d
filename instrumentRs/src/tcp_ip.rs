//! This module provides the implementation for an instrument controlled via TCP/IP.
//!
//! It includes a blocking implementation of the `Instrument` trait using the
//! [`std::net::TcpStream`] struct.

use std::{
    fmt::Debug,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use tracing::debug;

use crate::{DEFAULT_TIMEOUT, Instrument, InstrumentError};

/// A blocking TCP/IP implementation using the [`std::net::TcpStream`] struct.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Try to create a new TCP/IP instrument with the default timeout of three seconds.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function. Note that the terminator is automatically appended to commands and reading
    /// responses will read until the terminator is found.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address, e.g., `"192.168.1.100:7773"`.
    pub fn simple<A: ToSocketAddrs + Debug>(
        sock_addr: A,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        Self::full(sock_addr, DEFAULT_TIMEOUT)
    }

    /// Try to create a new TCP/IP instrument with a given timeout.
    ///
    /// The timeout is set as read and write timeout on the stream. We never want to block
    /// infinitely, as this is not wanted for instrument communications, especially when they are
    /// blocking. A zero timeout is therefore rejected.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Read and write timeout of the stream.
    pub fn full<A: ToSocketAddrs + Debug>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        if timeout.is_zero() {
            return Err(InstrumentError::InvalidArgument(
                "The timeout of a TCP/IP interface must be larger than zero.".into(),
            ));
        }
        let stream = TcpStream::connect(&sock_addr).map_err(|e| {
            InstrumentError::ConnectionFailed(format!("Failed to connect to {sock_addr:?}: {e}"))
        })?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        debug!(addr = ?sock_addr, ?timeout, "Connected to instrument via TCP/IP");
        Ok(Instrument::new(stream, timeout))
    }
}
