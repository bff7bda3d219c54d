//! InstrumentRs: Talk to your (scientific) equipment from with Rust
//!
//! The InstrumentRs library provides standardized interfaces to talk to scientific equipment via
//! various different ports. To do so, it provides an [`InstrumentInterface`] trait and its
//! implementations. Furthermore, we also provide an [`InstrumentError`] error type that instrument
//! drivers should return.
//!
//! # Currently implemented interfaces are:
//! - Any blocking port that implements [`std::io::Read`] and [`std::io::Write`] via [`Instrument`].
//! - TCP/IP (blocking) using [`std::net::TcpStream`], see [`TcpIpInterface`].
//!
//! Instruments either talk in strings that end with a terminator (message based instruments,
//! e.g., SCPI devices) or in packages of bytes that the driver assembles and disassembles itself
//! (e.g., length-prefixed frames). The trait supports both: `sendcmd`, `query`, and
//! `read_until_terminator` for the former, `write_raw`, `read_exact`, and `read_available` for the
//! latter.
//!
//! # Testing your driver
//!
//! All drivers should be tested without hardware using the provided loopback interfaces:
//! [`LoopbackInterfaceString`] for terminated strings and [`LoopbackInterfaceBytes`] for raw
//! byte packages. Both panic on unexpected commands and on leftover expected traffic.
//!
//! # Logging
//!
//! The library emits [`tracing`] events (connects, closes, and raw traffic at `trace` level), but
//! never installs a subscriber. This is up to the application.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

mod instrument;
mod loopback;
mod tcp_ip;

pub use instrument::Instrument;
pub use loopback::{LoopbackInterfaceBytes, LoopbackInterfaceString};
pub use tcp_ip::TcpIpInterface;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{trace, warn};

/// The default timeout for interfaces that do not specify their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// The error enum for all instruments.
///
/// For any command sending or querying, your instrument should return either an empty result or a
/// result with the query where this Error is the alternative. [`InstrumentError`] makes it easy to
/// propagate all the sending commands, querying errors forward with the `?` operator such that
/// errors propagate nicely. If this is not possible, it is considered a bug and should be
/// reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// A command is too long to be expressed by the length prefix of the framing protocol.
    #[error("Command '{cmd}' is too long: at most {max} bytes can be framed.")]
    CommandTooLong {
        /// The command that was rejected.
        cmd: String,
        /// The maximum number of bytes the length prefix can express.
        max: usize,
    },
    /// Connecting to the instrument failed, e.g., because the endpoint is unreachable or refused
    /// the connection. The message contains the address and the reason.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// A given float value is out of the specified range. The error contains the value that was
    /// sent, the minimum value that is allowed, and the maximum value that is allowed.
    #[error("Float value {value} is out of range. Allowed range is [{min}, {max}]")]
    FloatValueOutOfRange {
        /// The value that is out of range.
        value: f64,
        /// The minimum value that is allowed.
        min: f64,
        /// The maximum value that is allowed.
        max: f64,
    },
    /// A frame received from the instrument could not be decoded, e.g., it was shorter than its
    /// header or did not contain valid text.
    #[error("Invalid frame received from instrument: {0}")]
    FrameInvalid(String),
    /// The interface was closed and cannot be used anymore.
    #[error("The interface is closed.")]
    InterfaceClosed,
    /// The called command is not supported by this interface.
    #[error("This command is not supported by this interface.")]
    InterfaceCommandNotSupported,
    /// Error when an invalid argument is passed to a function. This error contains only an error
    /// message, but no arguments. It is intended for the user.
    #[error("{0}")]
    InvalidArgument(String),
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Instrument response could not be parsed becuase it was unexpected by the driver. This error
    /// contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    /// Timeout occurred while waiting for a response from the instrument. The error contains the
    /// timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
}

impl InstrumentError {
    /// Attach the query that was sent to a plain [`InstrumentError::Timeout`].
    ///
    /// All other errors are returned unchanged.
    pub fn with_query(self, query: &str) -> Self {
        match self {
            InstrumentError::Timeout(timeout) => InstrumentError::TimeoutQuery {
                query: query.to_string(),
                timeout,
            },
            err => err,
        }
    }
}

/// The `InstrumentInterface` trait defines the interface for controlling instruments.
///
/// Implementors must provide a way to write raw bytes to and read an exact number of bytes from
/// the instrument. Everything else has a default implementation that builds on these two, but
/// can be overwritten if the interface can do better.
pub trait InstrumentInterface {
    /// Write raw bytes to the instrument and flush the interface.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Read exactly `buf.len()` bytes from the instrument.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Read whatever the instrument has sent in one single receive call.
    ///
    /// Returns the number of bytes that were written into `buf`. A return value of zero means
    /// that the instrument closed the connection or sent nothing. This does not loop to assemble
    /// a message from multiple partial reads.
    fn read_available(&mut self, _buf: &mut [u8]) -> Result<usize, InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }

    /// Get the terminator of the interface.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that will be used as the terminator for commands
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout that the interface uses when waiting for a response.
    fn get_timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// Release the underlying port.
    ///
    /// Closing an interface that is already closed must not fail.
    fn close(&mut self) -> Result<(), InstrumentError> {
        Ok(())
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    ///
    /// # Arguments:
    /// - `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let cmd = format!("{}{}", cmd, self.get_terminator());
        trace!(cmd = cmd.as_str(), "sending command");
        self.write_raw(cmd.as_bytes())
    }

    /// Read from the instrument byte by byte until the terminator is encountered.
    ///
    /// The terminator is stripped from the returned string. If no terminator is encountered
    /// before the timeout is reached, an [`InstrumentError::Timeout`] is returned. Bytes that are
    /// not valid UTF-8 are replaced and a warning is emitted.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.get_terminator().as_bytes().to_vec();
        let timeout = self.get_timeout();
        let mut response = Vec::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            response.push(single_buf[0]);
            if response.ends_with(&terminator) {
                response.truncate(response.len() - terminator.len());
                let resp = match String::from_utf8(response) {
                    Ok(resp) => resp,
                    Err(err) => {
                        warn!(bytes = ?err.as_bytes(), "received invalid UTF-8 data");
                        String::from_utf8_lossy(err.as_bytes()).into_owned()
                    }
                };
                trace!(resp = resp.as_str(), "received response");
                return Ok(resp);
            }
        }
        Err(InstrumentError::Timeout(timeout))
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This function uses `sendcmd` to send the command and then reads the response until the
    /// terminator is encountered. A timeout is reported together with the query that was sent.
    ///
    /// # Arguments
    /// * `cmd` - The command to send to the instrument for which we expect a response.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        self.read_until_terminator().map_err(|e| e.with_query(cmd))
    }
}
