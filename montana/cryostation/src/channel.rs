//! The framed request/response channel to the Cryostation software.

use std::net::TcpStream;

use instrumentrs::{Instrument, InstrumentError, InstrumentInterface};
use tracing::{debug, trace, warn};

use crate::{
    frame::{FrameConfig, RESPONSE_HEADER_LEN, decode_frame, encode_frame},
    interface::TcpIpInterfaceCryostation,
};

/// A channel that exchanges exactly one framed request and one framed response per call.
///
/// The channel owns its interface. Every [`FramedChannel::request`] writes one length-prefixed
/// frame and then waits for one single receive call of at most `max_response_size` bytes. A
/// response that the instrument delivers in multiple pieces is therefore truncated to the first
/// piece. Failures are never retried.
///
/// The channel is released by [`FramedChannel::close`] or, at the latest, when it is dropped.
///
/// # Example
///
/// ```no_run
/// use montana_cryostation::FramedChannel;
///
/// let mut channel = FramedChannel::open("192.168.1.100", 7773).unwrap();
/// let temperature = channel.request("GPT").unwrap();
/// channel.close().unwrap();
/// ```
pub struct FramedChannel<T: InstrumentInterface> {
    interface: T,
    config: FrameConfig,
    closed: bool,
}

impl FramedChannel<Instrument<TcpStream>> {
    /// Open a TCP/IP connection to the Cryostation software and wrap it into a channel.
    ///
    /// The read timeout is two seconds, the framing uses the default [`FrameConfig`].
    ///
    /// # Arguments
    /// * `host` - IP address or host name of the computer running the Cryostation software.
    /// * `port` - TCP port, usually [`crate::DEFAULT_PORT`].
    pub fn open(host: &str, port: u16) -> Result<Self, InstrumentError> {
        let interface = TcpIpInterfaceCryostation::full(host, port)?;
        Self::try_new(interface, FrameConfig::default())
    }
}

impl<T: InstrumentInterface> FramedChannel<T> {
    /// Create a new channel with the given interface and framing configuration.
    ///
    /// Fails if the receive buffer cannot hold more than the response header.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that supports single receive calls.
    /// * `config` - The framing configuration.
    pub fn try_new(interface: T, config: FrameConfig) -> Result<Self, InstrumentError> {
        if config.max_response_size <= RESPONSE_HEADER_LEN {
            return Err(InstrumentError::InvalidArgument(format!(
                "The response buffer must be larger than the {RESPONSE_HEADER_LEN} byte header, \
                 got {} bytes.",
                config.max_response_size
            )));
        }
        Ok(Self {
            interface,
            config,
            closed: false,
        })
    }

    /// Send one command and return the payload of the response.
    ///
    /// An empty string is returned if the instrument sent nothing, e.g., because it closed the
    /// connection. A timeout is reported as [`InstrumentError::TimeoutQuery`] with the command.
    ///
    /// # Arguments
    /// * `cmd` - The command, e.g., `"GPT"`, without length prefix.
    pub fn request(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        if self.closed {
            return Err(InstrumentError::InterfaceClosed);
        }
        let frame = encode_frame(cmd, self.config.prefix)?;
        trace!(frame = ?String::from_utf8_lossy(&frame), "sending frame");
        self.interface
            .write_raw(&frame)
            .map_err(|e| e.with_query(cmd))?;

        let mut buf = vec![0u8; self.config.max_response_size];
        let n = self
            .interface
            .read_available(&mut buf)
            .map_err(|e| e.with_query(cmd))?;
        trace!(response = ?String::from_utf8_lossy(&buf[..n]), "received frame");
        if n == buf.len() {
            warn!(cmd, n, "Response filled the whole receive buffer and may be truncated");
        }
        decode_frame(&buf[..n])
    }

    /// Close the channel and release the interface.
    ///
    /// Closing an already closed channel does nothing.
    pub fn close(&mut self) -> Result<(), InstrumentError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("Closing framed channel");
        self.interface.close()
    }

    /// Returns `true` if the channel was closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Get the framing configuration.
    pub fn config(&self) -> FrameConfig {
        self.config
    }

    /// Borrow the underlying interface.
    pub fn get_ref(&self) -> &T {
        &self.interface
    }
}

impl<T: InstrumentInterface> Drop for FramedChannel<T> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(%err, "Failed to close framed channel");
        }
    }
}
