//! Which peripherals are active and where they live on the bus.

use core::fmt;

/// Index of the host I2C controller both peripherals hang off.
pub const I2C_BUS_INDEX: u8 = 1;

/// Highest valid 7-bit address.
const MAX_ADDRESS: u8 = 0x7F;

/// One of the two supported peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    /// SSD1306 OLED panel.
    Display,
    /// AHT20 temperature/humidity sensor.
    Sensor,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Peripheral::Display => f.write_str("SSD1306 display"),
            Peripheral::Sensor => f.write_str("AHT20 sensor"),
        }
    }
}

/// Startup choice of active peripherals.
///
/// Inactive peripherals are never constructed; requests aimed at them fail
/// with [`DeviceNotPresent`](crate::PeripheralError::DeviceNotPresent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralSelection {
    #[default]
    Both,
    DisplayOnly,
    SensorOnly,
}

impl PeripheralSelection {
    /// `true` if `peripheral` is part of this selection.
    pub fn includes(self, peripheral: Peripheral) -> bool {
        matches!(
            (self, peripheral),
            (PeripheralSelection::Both, _)
                | (PeripheralSelection::DisplayOnly, Peripheral::Display)
                | (PeripheralSelection::SensorOnly, Peripheral::Sensor)
        )
    }
}

/// Numeric selector: `0` = both, `1` = display only, `2` = sensor only.
impl TryFrom<u8> for PeripheralSelection {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PeripheralSelection::Both),
            1 => Ok(PeripheralSelection::DisplayOnly),
            2 => Ok(PeripheralSelection::SensorOnly),
            other => Err(ConfigError::InvalidSelection(other)),
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Numeric selector outside `0..=2`.
    InvalidSelection(u8),
    /// Address does not fit in 7 bits.
    InvalidAddress(u8),
    /// Both active peripherals configured at the same address.
    AddressConflict(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidSelection(v) => {
                write!(f, "Invalid peripheral selection {} (must be 0-2)", v)
            }
            ConfigError::InvalidAddress(a) => write!(f, "Invalid 7-bit I2C address {:#04x}", a),
            ConfigError::AddressConflict(a) => {
                write!(f, "Display and sensor both configured at {:#04x}", a)
            }
        }
    }
}

/// Registry configuration.
///
/// [`RegistryConfig::default()`] is both peripherals at their fixed
/// addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryConfig {
    /// Active peripherals. Default: both.
    pub selection: PeripheralSelection,
    /// SSD1306 address. Default: `0x3C`.
    pub display_address: u8,
    /// AHT20 address. Default: `0x38`.
    pub sensor_address: u8,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            selection: PeripheralSelection::Both,
            display_address: etx_oled_display_rs::DEFAULT_ADDRESS,
            sensor_address: aht20_driver::DEFAULT_ADDRESS,
        }
    }
}

impl RegistryConfig {
    /// Default addresses with the given selection.
    pub fn with_selection(selection: PeripheralSelection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    /// Address configured for `peripheral`.
    pub fn address_of(&self, peripheral: Peripheral) -> u8 {
        match peripheral {
            Peripheral::Display => self.display_address,
            Peripheral::Sensor => self.sensor_address,
        }
    }

    /// Check addresses of the active peripherals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for peripheral in [Peripheral::Display, Peripheral::Sensor] {
            let address = self.address_of(peripheral);
            if self.selection.includes(peripheral) && address > MAX_ADDRESS {
                return Err(ConfigError::InvalidAddress(address));
            }
        }

        if self.selection == PeripheralSelection::Both
            && self.display_address == self.sensor_address
        {
            return Err(ConfigError::AddressConflict(self.display_address));
        }

        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let c = RegistryConfig::default();
        assert_eq!(c.selection, PeripheralSelection::Both);
        assert_eq!(c.display_address, 0x3C);
        assert_eq!(c.sensor_address, 0x38);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn selection_from_numeric_selector() {
        assert_eq!(PeripheralSelection::try_from(0), Ok(PeripheralSelection::Both));
        assert_eq!(PeripheralSelection::try_from(1), Ok(PeripheralSelection::DisplayOnly));
        assert_eq!(PeripheralSelection::try_from(2), Ok(PeripheralSelection::SensorOnly));
        assert_eq!(
            PeripheralSelection::try_from(3),
            Err(ConfigError::InvalidSelection(3))
        );
    }

    #[test]
    fn selection_membership() {
        use Peripheral::*;
        assert!(PeripheralSelection::Both.includes(Display));
        assert!(PeripheralSelection::Both.includes(Sensor));
        assert!(PeripheralSelection::DisplayOnly.includes(Display));
        assert!(!PeripheralSelection::DisplayOnly.includes(Sensor));
        assert!(!PeripheralSelection::SensorOnly.includes(Display));
        assert!(PeripheralSelection::SensorOnly.includes(Sensor));
    }

    #[test]
    fn conflicting_addresses_rejected_only_when_both_active() {
        let c = RegistryConfig {
            sensor_address: 0x3C,
            ..RegistryConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::AddressConflict(0x3C)));

        let c = RegistryConfig {
            selection: PeripheralSelection::DisplayOnly,
            ..c
        };
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn eight_bit_address_rejected() {
        let c = RegistryConfig {
            display_address: 0x78 << 1,
            ..RegistryConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::InvalidAddress(0xF0)));

        // Inactive peripherals are not checked.
        let c = RegistryConfig::with_selection(PeripheralSelection::SensorOnly);
        let c = RegistryConfig {
            display_address: 0xFF,
            ..c
        };
        assert_eq!(c.validate(), Ok(()));
    }
}
