//! Registry-level errors, tagged with the peripheral involved.

use core::fmt;

use aht20_driver::{SensorError, SensorState};
use etx_oled_display_rs::{DisplayState, OledError};

use crate::config::Peripheral;

/// State a controller was in when it refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    Display(DisplayState),
    Sensor(SensorState),
}

impl DeviceState {
    /// The peripheral the state belongs to.
    pub fn peripheral(&self) -> Peripheral {
        match self {
            DeviceState::Display(_) => Peripheral::Display,
            DeviceState::Sensor(_) => Peripheral::Sensor,
        }
    }
}

/// Errors returned by [`PeripheralRegistry`](crate::PeripheralRegistry)
/// and [`ControlSurface`](crate::ControlSurface) operations.
///
/// `E` is the bus error type. Every variant names the peripheral the failed
/// request was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError<E> {
    /// Bus write or read failed. Never retried automatically.
    Transport { peripheral: Peripheral, error: E },
    /// Operation invoked out of sequence (read before trigger, RAM write
    /// while the panel is off or not yet initialised). Carries the state
    /// the controller refused it in.
    InvalidState { peripheral: Peripheral, state: DeviceState },
    /// Operation invoked before the peripheral was successfully attached.
    NotInitialized(Peripheral),
    /// The peripheral is excluded by the configuration.
    DeviceNotPresent(Peripheral),
}

impl<E> PeripheralError<E> {
    /// The peripheral involved.
    pub fn peripheral(&self) -> Peripheral {
        match self {
            PeripheralError::Transport { peripheral, .. }
            | PeripheralError::InvalidState { peripheral, .. } => *peripheral,
            PeripheralError::NotInitialized(peripheral)
            | PeripheralError::DeviceNotPresent(peripheral) => *peripheral,
        }
    }
}

impl<E> From<OledError<E>> for PeripheralError<E> {
    fn from(error: OledError<E>) -> Self {
        let peripheral = Peripheral::Display;
        match error {
            OledError::I2c(error) => PeripheralError::Transport { peripheral, error },
            OledError::InvalidState(state) => PeripheralError::InvalidState {
                peripheral,
                state: DeviceState::Display(state),
            },
        }
    }
}

impl<E> From<SensorError<E>> for PeripheralError<E> {
    fn from(error: SensorError<E>) -> Self {
        let peripheral = Peripheral::Sensor;
        match error {
            SensorError::I2c(error) => PeripheralError::Transport { peripheral, error },
            SensorError::InvalidState(state) => PeripheralError::InvalidState {
                peripheral,
                state: DeviceState::Sensor(state),
            },
            SensorError::NotInitialized => PeripheralError::NotInitialized(peripheral),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for PeripheralError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PeripheralError::Transport { peripheral, error } => {
                write!(f, "{}: I2C error: {:?}", peripheral, error)
            }
            PeripheralError::InvalidState { peripheral, state } => {
                write!(f, "{}: operation not valid in state {:?}", peripheral, state)
            }
            PeripheralError::NotInitialized(peripheral) => {
                write!(f, "{}: not initialized", peripheral)
            }
            PeripheralError::DeviceNotPresent(peripheral) => {
                write!(f, "{}: not present in this configuration", peripheral)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for PeripheralError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PeripheralError::Transport { peripheral, error } => {
                defmt::write!(f, "{}: I2C error: {}", peripheral, error)
            }
            PeripheralError::InvalidState { peripheral, state } => {
                defmt::write!(f, "{}: invalid state {}", peripheral, state)
            }
            PeripheralError::NotInitialized(peripheral) => {
                defmt::write!(f, "{}: not initialized", peripheral)
            }
            PeripheralError::DeviceNotPresent(peripheral) => {
                defmt::write!(f, "{}: not present", peripheral)
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    type Error = PeripheralError<()>;

    #[test]
    fn display_state_is_carried() {
        let e = Error::from(OledError::InvalidState(DisplayState::Off));
        assert_eq!(
            e,
            PeripheralError::InvalidState {
                peripheral: Peripheral::Display,
                state: DeviceState::Display(DisplayState::Off),
            }
        );
        assert_eq!(e.peripheral(), Peripheral::Display);
    }

    #[test]
    fn sensor_state_and_missing_init_stay_distinct() {
        let e = Error::from(SensorError::InvalidState(SensorState::Triggered));
        assert_eq!(
            e,
            PeripheralError::InvalidState {
                peripheral: Peripheral::Sensor,
                state: DeviceState::Sensor(SensorState::Triggered),
            }
        );

        let e = Error::from(SensorError::NotInitialized);
        assert_eq!(e, PeripheralError::NotInitialized(Peripheral::Sensor));
        assert_eq!(e.peripheral(), Peripheral::Sensor);
    }

    #[test]
    fn transport_error_keeps_bus_error() {
        let e: PeripheralError<u8> = OledError::I2c(7u8).into();
        assert_eq!(
            e,
            PeripheralError::Transport {
                peripheral: Peripheral::Display,
                error: 7,
            }
        );
    }
}
