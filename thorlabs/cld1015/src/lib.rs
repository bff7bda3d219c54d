//! A rust driver for the Thorlabs CLD1015 laser diode and TEC controller.
//!
//! The CLD1015 is a message based instrument: commands and responses are strings that are
//! terminated with `"\n"`. This driver switches the laser diode (LD) and the thermoelectric
//! cooler (TEC) on and off and sets and reads the laser diode current.
//!
//! The CLD1015 needs some time to process a command. The driver therefore waits 200 ms after
//! every command that is written to the instrument, see [`Cld1015::set_com_delay`].
//!
//! # Example
//!
//! ```no_run
//! use measurements::Current;
//! use thorlabs_cld1015::{Cld1015, PowerOnOutcome, UsbTmcInterfaceCld1015};
//!
//! let interface = UsbTmcInterfaceCld1015::simple("/dev/usbtmc0").unwrap();
//! let mut inst = Cld1015::try_new(interface).unwrap();
//!
//! println!("Instrument: {}", inst.get_name().unwrap());
//!
//! // The laser can only be turned on if the TEC is running.
//! inst.set_tec_state(true).unwrap();
//! inst.set_ld_current(Current::from_milliamperes(150.0)).unwrap();
//! match inst.on().unwrap() {
//!     PowerOnOutcome::LaserOn => println!("Laser is on"),
//!     outcome => println!("Laser not turned on: {outcome}"),
//! }
//! inst.off().unwrap();
//! ```

#![warn(missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use instrumentrs::{InstrumentError, InstrumentInterface};
use measurements::Current;
use tracing::warn;

pub use interface::UsbTmcInterfaceCld1015;

mod interface;

/// Default delay after writing a command to the instrument.
pub const DEFAULT_COM_DELAY: Duration = Duration::from_millis(200);

/// Maximum laser diode current in A that can be set.
const LD_CURRENT_MAX: f64 = 1.2;

/// Upper bound of entries read from the error queue in one go.
const ERROR_QUEUE_MAX: usize = 32;

/// Outcome of the [`Cld1015::on`] action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOnOutcome {
    /// The TEC was running and the laser diode output was switched on.
    LaserOn,
    /// The TEC was not running, the laser diode output was not touched.
    TecOff,
}

impl Display for PowerOnOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerOnOutcome::LaserOn => write!(f, "laser diode on"),
            PowerOnOutcome::TecOff => write!(f, "temperature controller not on"),
        }
    }
}

/// A rust driver for the CLD1015.
///
/// This driver provides functionality to control the Thorlabs/CLD1015.
/// See the top-level documentation for an example on how to use this driver.
pub struct Cld1015<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    com_delay: Duration,
}

impl<T: InstrumentInterface> Cld1015<T> {
    /// Create a new CLD1015 instance with the given instrument interface.
    ///
    /// The terminator of the interface is set to `"\n"`.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        let interface = Arc::new(Mutex::new(intf));
        Ok(Cld1015 {
            interface,
            com_delay: DEFAULT_COM_DELAY,
        })
    }

    /// Set the delay after every command that is written to the instrument.
    ///
    /// # Arguments
    /// * `delay` - The new delay, 200 ms by default.
    pub fn set_com_delay(&mut self, delay: Duration) {
        self.com_delay = delay;
    }

    /// Query the name of the instrument.
    ///
    /// Returns a comma-separated string of manufacturer, model, serial number, and firmware
    /// version.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        Ok(self.query("*IDN?")?.trim().to_string())
    }

    /// Returns `true` if the laser diode output is on.
    pub fn get_ld_state(&mut self) -> Result<bool, InstrumentError> {
        let response = self.query("OUTP1:STAT?")?;
        parse_state(&response)
    }

    /// Switch the laser diode output on or off.
    ///
    /// Note that the CLD1015 will not switch on the laser diode output if the TEC is off. Use
    /// [`Cld1015::on`] to only switch it on with a running TEC.
    pub fn set_ld_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("OUTP1:STAT {}", state as u8))
    }

    /// Returns `true` if the TEC output is on.
    pub fn get_tec_state(&mut self) -> Result<bool, InstrumentError> {
        let response = self.query("OUTP2:STAT?")?;
        parse_state(&response)
    }

    /// Switch the TEC output on or off.
    pub fn set_tec_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("OUTP2:STAT {}", state as u8))
    }

    /// Get the laser diode current setpoint.
    pub fn get_ld_current_setpoint(&mut self) -> Result<Current, InstrumentError> {
        let response = self.query("SOUR:CURR?")?;
        Ok(Current::from_amperes(parse_float(&response)?))
    }

    /// Get the measured laser diode current.
    pub fn get_ld_current(&mut self) -> Result<Current, InstrumentError> {
        let response = self.query("MEAS:CURR?")?;
        Ok(Current::from_amperes(parse_float(&response)?))
    }

    /// Set the laser diode current setpoint.
    ///
    /// # Arguments
    /// * `current` - The new setpoint, between 0 A and 1.2 A.
    pub fn set_ld_current(&mut self, current: Current) -> Result<(), InstrumentError> {
        let amps = current.as_amperes();
        if !(0.0..=LD_CURRENT_MAX).contains(&amps) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: amps,
                min: 0.0,
                max: LD_CURRENT_MAX,
            });
        }
        self.sendcmd(&format!("SOUR:CURR {amps:.5}"))
    }

    /// Returns `true` if the interlock key lock tripped.
    pub fn get_key_locked(&mut self) -> Result<bool, InstrumentError> {
        let response = self.query("OUTP:PROT:KEYL:TRIP?")?;
        parse_state(&response)
    }

    /// Read all entries of the error queue of the instrument.
    ///
    /// Queries the next error until the instrument reports `No error`. The returned vector is
    /// empty if no errors were queued.
    pub fn read_error_queue(&mut self) -> Result<Vec<String>, InstrumentError> {
        let mut errors = Vec::new();
        for _ in 0..ERROR_QUEUE_MAX {
            let response = self.query("SYST:ERR:NEXT?")?;
            if response.contains("No error") {
                return Ok(errors);
            }
            errors.push(response.trim().to_string());
        }
        warn!(
            n = errors.len(),
            "Error queue not empty after reading the maximum number of entries"
        );
        Ok(errors)
    }

    /// Switch the laser diode on, but only if the TEC is running.
    ///
    /// This reads the TEC state and then, if the TEC is on, switches the laser diode output on.
    /// The two steps are not atomic: the TEC state can change in between, e.g., by another clone
    /// of this driver or at the front panel.
    ///
    /// If the TEC is off, nothing is written to the instrument and
    /// [`PowerOnOutcome::TecOff`] is returned.
    pub fn on(&mut self) -> Result<PowerOnOutcome, InstrumentError> {
        if self.get_tec_state()? {
            self.set_ld_state(true)?;
            Ok(PowerOnOutcome::LaserOn)
        } else {
            warn!("Laser diode not switched on: temperature controller not on");
            Ok(PowerOnOutcome::TecOff)
        }
    }

    /// Switch the laser diode off. The TEC keeps running.
    pub fn off(&mut self) -> Result<(), InstrumentError> {
        self.set_ld_state(false)
    }

    /// Send a command to the instrument and wait for it to be processed.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        {
            let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
            intf.sendcmd(cmd)?;
        }
        if !self.com_delay.is_zero() {
            thread::sleep(self.com_delay);
        }
        Ok(())
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }
}

impl<T: InstrumentInterface> Clone for Cld1015<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            com_delay: self.com_delay,
        }
    }
}

/// Parse a `0`/`1` state response.
fn parse_state(response: &str) -> Result<bool, InstrumentError> {
    match response.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(InstrumentError::ResponseParseError(format!(
            "Failed to parse state from response '{response}'"
        ))),
    }
}

fn parse_float(response: &str) -> Result<f64, InstrumentError> {
    response.trim().parse::<f64>().map_err(|e| {
        InstrumentError::ResponseParseError(format!(
            "Failed to parse value from response '{response}': {e}"
        ))
    })
}
