//! Request-level surface on top of the registry.
//!
//! [`ControlSurface`] exposes the three external requests (clear, fill,
//! read sensor) either as typed calls or through the numeric command
//! encoding of the Linux character-device interface. Every request
//! is executed to completion before it returns; nothing is queued.

use core::fmt;

use aht20_driver::Measurement;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::PeripheralError;
use crate::registry::PeripheralRegistry;

// ── Command encoding ─────────────────────────────────────────────────────

/// Clear the panel (`_IO('o', 1)`).
pub const OLED_CLEAR: u32 = 0x0000_6F01;
/// Fill the panel with `0xFF` (`_IO('o', 2)`).
pub const OLED_FILL: u32 = 0x0000_6F02;
/// Read one measurement into an 8-byte reply (`_IOR('a', 1, 8)`).
pub const AHT20_READ_DATA: u32 = 0x8008_6101;

/// Pattern used by [`OLED_FILL`], which carries no payload.
pub const DEFAULT_FILL_PATTERN: u8 = 0xFF;

/// An external request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    Clear,
    Fill(u8),
    ReadSensor,
}

impl Request {
    /// Decode a numeric command.
    pub fn from_command<E>(code: u32) -> Result<Self, ControlError<E>> {
        match code {
            OLED_CLEAR => Ok(Request::Clear),
            OLED_FILL => Ok(Request::Fill(DEFAULT_FILL_PATTERN)),
            AHT20_READ_DATA => Ok(Request::ReadSensor),
            other => Err(ControlError::UnknownCommand(other)),
        }
    }

    /// Number of reply bytes the request produces.
    pub fn reply_len(&self) -> usize {
        match self {
            Request::ReadSensor => SensorReading::LEN,
            Request::Clear | Request::Fill(_) => 0,
        }
    }
}

/// Result of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Done,
    Measurement(Measurement),
}

/// Wire form of a measurement reply: two `i32` fields, temperature then
/// humidity, each in tenths, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub temperature: i32,
    pub humidity: i32,
}

impl SensorReading {
    /// Encoded size in bytes.
    pub const LEN: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[..4].copy_from_slice(&self.temperature.to_le_bytes());
        bytes[4..].copy_from_slice(&self.humidity.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self {
            temperature: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            humidity: i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

impl From<Measurement> for SensorReading {
    fn from(m: Measurement) -> Self {
        Self {
            temperature: m.temperature_tenths_c,
            humidity: m.humidity_tenths_pct,
        }
    }
}

impl From<SensorReading> for Measurement {
    fn from(r: SensorReading) -> Self {
        Measurement {
            temperature_tenths_c: r.temperature,
            humidity_tenths_pct: r.humidity,
        }
    }
}

// ── ControlError ─────────────────────────────────────────────────────────

/// Errors returned by [`ControlSurface`] request handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError<E> {
    /// The underlying peripheral operation failed.
    Peripheral(PeripheralError<E>),
    /// Numeric command not recognised.
    UnknownCommand(u32),
    /// Reply buffer too small for the request.
    InvalidPayload,
}

impl<E> From<PeripheralError<E>> for ControlError<E> {
    fn from(error: PeripheralError<E>) -> Self {
        ControlError::Peripheral(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ControlError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlError::Peripheral(e) => write!(f, "{}", e),
            ControlError::UnknownCommand(code) => write!(f, "Unknown command {:#010x}", code),
            ControlError::InvalidPayload => f.write_str("Reply buffer too small"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ControlError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ControlError::Peripheral(e) => defmt::write!(f, "{}", e),
            ControlError::UnknownCommand(code) => defmt::write!(f, "Unknown command {=u32:#x}", code),
            ControlError::InvalidPayload => defmt::write!(f, "Reply buffer too small"),
        }
    }
}

// ── ControlSurface ───────────────────────────────────────────────────────

/// Borrowed handle for issuing requests against a registry.
///
/// Cheap to copy; any number of surfaces may share one registry and the
/// registry lock serialises them.
pub struct ControlSurface<'r, M, BUS, D>
where
    M: RawMutex,
{
    registry: &'r PeripheralRegistry<M, BUS, D>,
}

impl<M: RawMutex, BUS, D> Clone for ControlSurface<'_, M, BUS, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, BUS, D> Copy for ControlSurface<'_, M, BUS, D> {}

impl<'r, M, BUS, D> ControlSurface<'r, M, BUS, D>
where
    M: RawMutex,
    BUS: I2c,
    D: DelayNs + Clone,
{
    pub fn new(registry: &'r PeripheralRegistry<M, BUS, D>) -> Self {
        Self { registry }
    }

    /// Blank the panel.
    pub async fn clear(&self) -> Result<(), PeripheralError<BUS::Error>> {
        self.registry.display_clear().await
    }

    /// Write `pattern` to the whole panel.
    pub async fn fill(&self, pattern: u8) -> Result<(), PeripheralError<BUS::Error>> {
        self.registry.display_fill(pattern).await
    }

    /// Take one measurement.
    pub async fn read_sensor(&self) -> Result<Measurement, PeripheralError<BUS::Error>> {
        self.registry.read_sensor().await
    }

    /// Execute a typed request.
    pub async fn handle(&self, request: Request) -> Result<Response, ControlError<BUS::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Handling {}", request);

        let response = match request {
            Request::Clear => {
                self.clear().await?;
                Response::Done
            }
            Request::Fill(pattern) => {
                self.fill(pattern).await?;
                Response::Done
            }
            Request::ReadSensor => Response::Measurement(self.read_sensor().await?),
        };
        Ok(response)
    }

    /// Execute a numeric command, writing any reply into `reply`.
    ///
    /// Returns the number of reply bytes written. The buffer is checked
    /// before any bus traffic.
    pub async fn dispatch(
        &self,
        code: u32,
        reply: &mut [u8],
    ) -> Result<usize, ControlError<BUS::Error>> {
        let request = Request::from_command::<BUS::Error>(code)?;
        let len = request.reply_len();
        if reply.len() < len {
            return Err(ControlError::InvalidPayload);
        }

        match self.handle(request).await? {
            Response::Done => Ok(0),
            Response::Measurement(m) => {
                reply[..len].copy_from_slice(&SensorReading::from(m).to_bytes());
                Ok(len)
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
