//! A rust driver for the Montana Instruments Cryostation.
//!
//! The Cryostation software accepts remote commands via TCP/IP (port 7773 by default). Every
//! command is sent as a length-prefixed frame and answered by exactly one response, see the
//! [`frame`] module for the wire format and [`FramedChannel`] for the request/response exchange.
//!
//! Numeric values that the Cryostation cannot currently measure are reported as
//! [`Reading::Unavailable`] instead of the reserved `-0.100` the instrument sends.
//!
//! # Example
//!
//! ```no_run
//! use measurements::Temperature;
//! use montana_cryostation::{Cryostation, Reading, TcpIpInterfaceCryostation};
//!
//! let interface = TcpIpInterfaceCryostation::simple("192.168.1.100").unwrap();
//! let mut inst = Cryostation::try_new(interface).unwrap();
//!
//! match inst.get_platform_temperature().unwrap() {
//!     Reading::Value(temp) => println!("Platform temperature: {} K", temp.as_kelvin()),
//!     Reading::Unavailable => println!("Platform temperature is currently unavailable"),
//! }
//!
//! inst.set_temperature_setpoint(Temperature::from_kelvin(3.2)).unwrap();
//! inst.start_cool_down().unwrap();
//!
//! // The connection is closed when `inst` goes out of scope, or explicitly:
//! inst.close().unwrap();
//! ```

#![warn(missing_docs)]

pub mod frame;

mod channel;
mod interface;
mod reading;

pub use channel::FramedChannel;
pub use frame::{FrameConfig, LengthPrefix};
pub use interface::{DEFAULT_PORT, DEFAULT_TIMEOUT, TcpIpInterfaceCryostation};
pub use reading::Reading;

use std::sync::{Arc, Mutex};

use instrumentrs::{InstrumentError, InstrumentInterface};
use measurements::{Power, Pressure, Temperature};
use tracing::warn;

use reading::parse_reading;

/// Pascal per millitorr, the chamber pressure is reported in mTorr.
const PASCAL_PER_MILLITORR: f64 = 0.13332236842;

/// A rust driver for the Cryostation.
///
/// This driver provides functionality to read the temperatures, stabilities, heater powers, and
/// the chamber pressure of a Montana Instruments Cryostation, to set the temperature setpoint,
/// and to start cool down, standby, and warm up. See the top-level documentation for an example.
///
/// Clones share the same connection. Requests from multiple clones are serialized, such that
/// only one request is in flight at any time.
pub struct Cryostation<T: InstrumentInterface> {
    channel: Arc<Mutex<FramedChannel<T>>>,
}

impl<T: InstrumentInterface> Cryostation<T> {
    /// Create a new Cryostation instance with the given instrument interface.
    ///
    /// Requests are framed with a single digit length prefix, as the Cryostation software
    /// expects.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        Self::try_new_with_config(interface, FrameConfig::default())
    }

    /// Create a new Cryostation instance with a custom framing configuration.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `config` - The framing configuration, e.g., for a two digit length prefix.
    pub fn try_new_with_config(interface: T, config: FrameConfig) -> Result<Self, InstrumentError> {
        let channel = FramedChannel::try_new(interface, config)?;
        Ok(Self::from_channel(channel))
    }

    /// Create a new Cryostation instance from an already configured channel.
    pub fn from_channel(channel: FramedChannel<T>) -> Self {
        Cryostation {
            channel: Arc::new(Mutex::new(channel)),
        }
    }

    /// Returns `true` if the Cryostation is in an alarm state, i.e., a system error is present.
    pub fn get_alarm_state(&mut self) -> Result<bool, InstrumentError> {
        let response = self.request("GAS")?;
        match response.trim() {
            "T" => {
                warn!("Cryostation is in alarm state");
                Ok(true)
            }
            "F" => Ok(false),
            _ => Err(InstrumentError::ResponseParseError(response)),
        }
    }

    /// Get the chamber pressure.
    pub fn get_chamber_pressure(&mut self) -> Result<Reading<Pressure>, InstrumentError> {
        let reading = self.get_reading("GCP")?;
        Ok(reading.map(|mtorr| Pressure::from_pascals(mtorr * PASCAL_PER_MILLITORR)))
    }

    /// Get the current platform temperature.
    pub fn get_platform_temperature(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GPT")
    }

    /// Get the platform stability.
    pub fn get_platform_stability(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GPS")
    }

    /// Get the current platform heater power.
    pub fn get_platform_heater_power(&mut self) -> Result<Reading<Power>, InstrumentError> {
        self.get_power_reading("GPHP")
    }

    /// Get the current stage 1 temperature.
    pub fn get_stage_1_temperature(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GS1T")
    }

    /// Get the current stage 1 heater power.
    pub fn get_stage_1_heater_power(&mut self) -> Result<Reading<Power>, InstrumentError> {
        self.get_power_reading("GS1HP")
    }

    /// Get the current stage 2 temperature.
    pub fn get_stage_2_temperature(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GS2T")
    }

    /// Get the sample temperature.
    pub fn get_sample_temperature(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GST")
    }

    /// Get the sample stability.
    pub fn get_sample_stability(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GSS")
    }

    /// Get the temperature of the user thermometer.
    pub fn get_user_temperature(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GUT")
    }

    /// Get the stability of the user thermometer.
    pub fn get_user_stability(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GUS")
    }

    /// Get the temperature setpoint of the Cryostation software.
    pub fn get_temperature_setpoint(&mut self) -> Result<Reading<Temperature>, InstrumentError> {
        self.get_temperature_reading("GTSP")
    }

    /// Set the temperature setpoint of the Cryostation software.
    ///
    /// The setpoint is sent with two decimals. With the default single digit length prefix,
    /// setpoints of 100 K and above do not fit into a frame and are rejected with
    /// [`InstrumentError::CommandTooLong`].
    ///
    /// Returns the response of the Cryostation software, which tells whether the setpoint was
    /// accepted.
    ///
    /// # Arguments
    /// * `setpoint` - The new temperature setpoint.
    pub fn set_temperature_setpoint(
        &mut self,
        setpoint: Temperature,
    ) -> Result<String, InstrumentError> {
        let kelvin = setpoint.as_kelvin();
        if !kelvin.is_finite() || kelvin < 0.0 {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: kelvin,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        self.request(&format!("STSP{kelvin:.2}"))
    }

    /// Start the cool down to the temperature setpoint.
    ///
    /// Returns the response of the Cryostation software, e.g., `"OK"`.
    pub fn start_cool_down(&mut self) -> Result<String, InstrumentError> {
        self.request("SCD")
    }

    /// Put the system into standby mode, see the manual for details.
    ///
    /// Returns the response of the Cryostation software.
    pub fn start_standby(&mut self) -> Result<String, InstrumentError> {
        self.request("SSB")
    }

    /// Stop the system.
    ///
    /// Returns the status of the command. Note that the Cryostation software cannot stop the
    /// system at all times, check the returned status.
    pub fn stop(&mut self) -> Result<String, InstrumentError> {
        self.request("STP")
    }

    /// Start the warm up to room temperature.
    ///
    /// Returns the response of the Cryostation software.
    pub fn start_warm_up(&mut self) -> Result<String, InstrumentError> {
        self.request("SWU")
    }

    /// Close the connection to the Cryostation.
    ///
    /// This closes the connection for all clones of this instance. Closing twice does nothing.
    pub fn close(&mut self) -> Result<(), InstrumentError> {
        let mut channel = self.channel.lock().expect("Mutex should not be poisoned");
        channel.close()
    }

    /// Send a request and return the response payload.
    fn request(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut channel = self.channel.lock().expect("Mutex should not be poisoned");
        channel.request(cmd)
    }

    /// Request a numeric reading and warn if it is unavailable.
    fn get_reading(&mut self, cmd: &str) -> Result<Reading<f64>, InstrumentError> {
        let response = self.request(cmd)?;
        let reading = parse_reading(&response)?;
        if reading.is_unavailable() {
            warn!(cmd, "Cryostation is unable to return a value");
        }
        Ok(reading)
    }

    fn get_temperature_reading(&mut self, cmd: &str) -> Result<Reading<Temperature>, InstrumentError> {
        Ok(self.get_reading(cmd)?.map(Temperature::from_kelvin))
    }

    fn get_power_reading(&mut self, cmd: &str) -> Result<Reading<Power>, InstrumentError> {
        Ok(self.get_reading(cmd)?.map(Power::from_watts))
    }
}

impl<T: InstrumentInterface> Clone for Cryostation<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}
