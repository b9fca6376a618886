//! AHT20 command bytes and timing constants.
//!
//! The AHT20 has no register map. The host writes three-byte commands and
//! reads back a fixed six-byte frame:
//!
//! ```text
//! byte 0   status (bit 7 busy, bit 3 calibrated)
//! byte 1   humidity[19:12]
//! byte 2   humidity[11:4]
//! byte 3   humidity[3:0] | temperature[19:16]
//! byte 4   temperature[15:8]
//! byte 5   temperature[7:0]
//! ```

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Initialise / load calibration.
pub const CMD_INITIALIZE: [u8; 3] = [0xBE, 0x08, 0x00];

/// Start one temperature + humidity conversion.
pub const CMD_TRIGGER_MEASUREMENT: [u8; 3] = [0xAC, 0x33, 0x00];

// ---------------------------------------------------------------------------
// Status byte
// ---------------------------------------------------------------------------

/// Set while a conversion is in progress.
pub const STATUS_BUSY: u8 = 0x80;

/// Set once the calibration coefficients are loaded.
pub const STATUS_CALIBRATED: u8 = 0x08;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Length of a measurement frame in bytes.
pub const MEASUREMENT_LEN: usize = 6;

/// Full scale of a 20-bit raw count (2^20).
pub const RAW_FULL_SCALE: u32 = 1 << 20;

/// Wait after [`CMD_INITIALIZE`].
pub const INIT_SETTLE_MS: u32 = 40;

/// Conversion time between [`CMD_TRIGGER_MEASUREMENT`] and a valid read.
pub const MEASUREMENT_SETTLE_MS: u32 = 80;

/// Fixed I2C address of the AHT20.
pub const DEFAULT_ADDRESS: u8 = 0x38;
