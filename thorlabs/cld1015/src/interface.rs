//! Provide a USBTMC interface for the CLD1015.

use std::{fs::File, fs::OpenOptions, time::Duration};

use instrumentrs::{Instrument, InstrumentError};
use tracing::debug;

/// A USBTMC interface for the CLD1015.
///
/// On Linux, the `usbtmc` kernel driver exposes the CLD1015 as a character device, e.g.,
/// `/dev/usbtmc0`, that can be read from and written to like a file. The read timeout is set by
/// the kernel driver, see its documentation to adjust it.
#[derive(Debug)]
pub struct UsbTmcInterfaceCld1015 {}

impl UsbTmcInterfaceCld1015 {
    /// Try to open the USBTMC device of the CLD1015.
    ///
    /// The returned interface carries a timeout of three seconds for terminated reads. A single
    /// blocking read on the device is only bounded by the timeout of the kernel driver.
    ///
    /// Arguments:
    /// * `device` - Path to the device, e.g., `"/dev/usbtmc0"`.
    pub fn simple(device: &str) -> Result<Instrument<File>, InstrumentError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .map_err(|e| {
                InstrumentError::ConnectionFailed(format!("Failed to open {device}: {e}"))
            })?;
        debug!(device, "Opened USBTMC device");
        Ok(Instrument::new(file, Duration::from_secs(3)))
    }
}
