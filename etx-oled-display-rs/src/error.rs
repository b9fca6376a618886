//! Error types for the OLED display driver.

use core::fmt;

use crate::driver::DisplayState;

/// Errors that can occur during OLED display operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OledError<E> {
    /// Underlying I2C bus error.
    I2c(E),
    /// The operation is not valid in the controller's current state
    /// (e.g. `fill()` before `initialize()` has completed).
    InvalidState(DisplayState),
}

// Allow ergonomic `?` propagation from raw I2C errors.
impl<E> From<E> for OledError<E> {
    fn from(error: E) -> Self {
        OledError::I2c(error)
    }
}

impl<E: fmt::Debug> fmt::Display for OledError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OledError::I2c(e) => write!(f, "I2C error: {:?}", e),
            OledError::InvalidState(state) => {
                write!(f, "Operation not valid while display is {:?}", state)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for OledError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            OledError::InvalidState(state) => defmt::write!(f, "Invalid state: {}", state),
        }
    }
}
