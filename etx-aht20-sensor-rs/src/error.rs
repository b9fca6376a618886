//! Error types for the sensor driver.

use core::fmt;

use crate::sensor::SensorState;

/// Errors that can occur when talking to the AHT20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError<E> {
    /// Underlying I2C bus error.
    I2c(E),

    /// Operation invoked out of sequence, e.g. a read without a prior
    /// trigger. Carries the state the controller was in.
    InvalidState(SensorState),

    /// Operation invoked before `initialize()` succeeded.
    NotInitialized,
}

// Allow ergonomic `?` propagation from raw I2C errors.
impl<E> From<E> for SensorError<E> {
    fn from(error: E) -> Self {
        SensorError::I2c(error)
    }
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SensorError::I2c(e) => write!(f, "I2C error: {:?}", e),
            SensorError::InvalidState(state) => {
                write!(f, "Operation not valid while sensor is {:?}", state)
            }
            SensorError::NotInitialized => write!(f, "Sensor not initialized"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for SensorError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SensorError::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            SensorError::InvalidState(state) => defmt::write!(f, "Invalid state: {}", state),
            SensorError::NotInitialized => defmt::write!(f, "Not initialized"),
        }
    }
}
