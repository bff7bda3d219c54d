//! Module to handle readings that the Cryostation may report as unavailable.

use std::fmt::Display;

use instrumentrs::InstrumentError;

/// Payloads the Cryostation sends instead of a number when a value cannot be measured.
const UNAVAILABLE: [&str; 2] = ["-0.100", "-0.1"];

/// A numeric reading from the Cryostation.
///
/// The Cryostation reports quantities it currently cannot measure with a reserved value of
/// `-0.100` instead of an error. This value is never handed out as if it were a real reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    /// A measured value.
    Value(T),
    /// The instrument could not measure the quantity.
    Unavailable,
}

impl<T> Reading<T> {
    /// Returns the measured value, or `None` if the reading is unavailable.
    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(val) => Some(val),
            Reading::Unavailable => None,
        }
    }

    /// Returns `true` if the instrument could not measure the quantity.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Reading::Unavailable)
    }

    /// Map the measured value, keeping an unavailable reading unavailable.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(val) => Reading::Value(f(val)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T: Display> Display for Reading<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Value(val) => write!(f, "{val}"),
            Reading::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Parse a response payload into a raw reading.
pub(crate) fn parse_reading(response: &str) -> Result<Reading<f64>, InstrumentError> {
    let response = response.trim();
    if UNAVAILABLE.contains(&response) {
        return Ok(Reading::Unavailable);
    }
    let val = response.parse::<f64>().map_err(|e| {
        InstrumentError::ResponseParseError(format!(
            "Failed to parse reading from response '{response}': {e}"
        ))
    })?;
    Ok(Reading::Value(val))
}
