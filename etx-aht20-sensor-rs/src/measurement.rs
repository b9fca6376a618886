//! Raw measurement frames and their fixed-point conversion.

use core::fmt;

use crate::commands::{MEASUREMENT_LEN, RAW_FULL_SCALE, STATUS_BUSY, STATUS_CALIBRATED};

/// The six bytes returned by the sensor after a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawMeasurement([u8; MEASUREMENT_LEN]);

impl RawMeasurement {
    /// Wrap a frame exactly as read from the bus.
    pub const fn new(bytes: [u8; MEASUREMENT_LEN]) -> Self {
        Self(bytes)
    }

    /// The frame bytes.
    pub fn as_bytes(&self) -> &[u8; MEASUREMENT_LEN] {
        &self.0
    }

    /// Status byte (byte 0).
    pub fn status(&self) -> u8 {
        self.0[0]
    }

    /// `true` if the sensor reported the conversion still running.
    pub fn is_busy(&self) -> bool {
        self.status() & STATUS_BUSY != 0
    }

    /// `true` if the sensor reported its calibration as loaded.
    pub fn is_calibrated(&self) -> bool {
        self.status() & STATUS_CALIBRATED != 0
    }

    /// 20-bit humidity count: bytes 1, 2 and the high nibble of byte 3.
    pub fn humidity_count(&self) -> u32 {
        let b = &self.0;
        ((b[1] as u32) << 12) | ((b[2] as u32) << 4) | ((b[3] as u32) >> 4)
    }

    /// 20-bit temperature count: the low nibble of byte 3, bytes 4 and 5.
    pub fn temperature_count(&self) -> u32 {
        let b = &self.0;
        (((b[3] & 0x0F) as u32) << 16) | ((b[4] as u32) << 8) | (b[5] as u32)
    }
}

/// A decoded reading in tenths of a unit (`235` = 23.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature in tenths of a degree Celsius.
    pub temperature_tenths_c: i32,
    /// Relative humidity in tenths of a percent.
    pub humidity_tenths_pct: i32,
}

impl Measurement {
    /// Decode a raw frame.
    ///
    /// ```text
    /// humidity    = count_h * 1000 / 2^20
    /// temperature = count_t * 2000 / 2^20 - 500
    /// ```
    ///
    /// Integer arithmetic with truncating division. A 20-bit count times
    /// 2000 stays below 2^32, so the products are computed in `u32`.
    pub fn from_raw(raw: &RawMeasurement) -> Self {
        let humidity = raw.humidity_count() * 1000 / RAW_FULL_SCALE;
        let temperature = raw.temperature_count() * 2000 / RAW_FULL_SCALE;

        Self {
            temperature_tenths_c: temperature as i32 - 500,
            humidity_tenths_pct: humidity as i32,
        }
    }
}

impl From<RawMeasurement> for Measurement {
    fn from(raw: RawMeasurement) -> Self {
        Self::from_raw(&raw)
    }
}

/// Format a tenths value as `whole.fraction`, keeping the sign of values
/// between -1 and 0 (`-5` → `-0.5`).
pub fn write_tenths<W: fmt::Write>(w: &mut W, tenths: i32) -> fmt::Result {
    let sign = if tenths < 0 { "-" } else { "" };
    let magnitude = tenths.unsigned_abs();
    write!(w, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_tenths(f, self.temperature_tenths_c)?;
        f.write_str(" C, ")?;
        write_tenths(f, self.humidity_tenths_pct)?;
        f.write_str(" %RH")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
