//! Provide a TCP/IP interface for the Cryostation.

use std::{net::TcpStream, time::Duration};

use instrumentrs::{Instrument, InstrumentError, TcpIpInterface};

/// The port the Cryostation software listens on by default.
pub const DEFAULT_PORT: u16 = 7773;

/// Read timeout for the Cryostation. A non-responding instrument should fail fast.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// A TcpIpInterface for the Cryostation.
///
/// Builds an InstrumentRs TCP/IP interface with the port and the timeout the Cryostation software
/// expects.
#[derive(Debug)]
pub struct TcpIpInterfaceCryostation {}

impl TcpIpInterfaceCryostation {
    /// Connect to the Cryostation software at the given host on the default port (7773).
    ///
    /// Arguments:
    /// * `host` - IP address or host name, e.g., `"192.168.1.100"`.
    pub fn simple(host: &str) -> Result<Instrument<TcpStream>, InstrumentError> {
        Self::full(host, DEFAULT_PORT)
    }

    /// Connect to the Cryostation software at the given host and port.
    ///
    /// The read and write timeouts are set to two seconds.
    ///
    /// Arguments:
    /// * `host` - IP address or host name, e.g., `"192.168.1.100"`.
    /// * `port` - TCP port of the Cryostation software.
    pub fn full(host: &str, port: u16) -> Result<Instrument<TcpStream>, InstrumentError> {
        TcpIpInterface::full((host, port), DEFAULT_TIMEOUT)
    }
}
