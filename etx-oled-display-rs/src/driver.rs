//! SSD1306 command/data byte protocol and display state machine.
//!
//! [`DisplayController`] tracks the panel lifecycle and turns high-level
//! operations (initialise, fill, clear, write a frame) into the controller's
//! two-byte transactions. It does not own the bus: every operation borrows
//! the I2C transport for its duration, so the caller decides how bus access
//! is serialised.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::commands::{
    CONTROL_COMMAND, CONTROL_DATA, DISPLAY_OFF, DISPLAY_ON, FRAME_BYTES, INIT_SEQUENCE,
    POWER_UP_SETTLE_MS, SET_CONTRAST,
};
use crate::error::OledError;
use crate::frame::Frame;

/// Lifecycle state of the panel as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayState {
    /// Constructed, no bus traffic yet.
    #[default]
    Uninitialized,
    /// Init sequence started but not completed. A failed `initialize()`
    /// leaves the controller here; calling it again is allowed.
    Initializing,
    /// Panel configured and on; RAM writes are accepted.
    Ready,
    /// Panel configured but switched off.
    Off,
}

/// Driver for an SSD1306 128×64 OLED on I2C.
///
/// # Lifecycle
///
/// 1. [`DisplayController::new()`]: no I2C traffic.
/// 2. [`DisplayController::initialize()`]: power-up settle, then the init table.
/// 3. [`fill()`](Self::fill) / [`clear()`](Self::clear) /
///    [`write_frame()`](Self::write_frame): full 1024-byte RAM writes.
/// 4. [`DisplayController::shutdown()`]: best-effort blank and power off.
///
/// Every byte is sent as an independent `{control, value}` write. No frame
/// is buffered inside the driver, so after a failed write the caller simply
/// re-issues the operation.
///
/// # Example
///
/// ```no_run
/// use etx_oled_display_rs::{DisplayController, DEFAULT_ADDRESS};
///
/// # async fn example(
/// #     mut i2c: impl embedded_hal_async::i2c::I2c,
/// #     delay: impl embedded_hal_async::delay::DelayNs,
/// # ) {
/// let mut oled = DisplayController::new(DEFAULT_ADDRESS, delay);
/// oled.initialize(&mut i2c).await.unwrap();
/// oled.fill(&mut i2c, 0xFF).await.unwrap();
/// # }
/// ```
pub struct DisplayController<D> {
    /// 7-bit I2C device address.
    address: u8,
    /// Delay provider for the power-up settle time.
    delay: D,
    state: DisplayState,
}

impl<D> DisplayController<D>
where
    D: DelayNs,
{
    /// Construct an uninitialised controller.
    ///
    /// No I2C traffic is generated. You **must** call
    /// [`initialize()`](Self::initialize) before any RAM writes.
    ///
    /// # Arguments
    /// * `address`: 7-bit I2C device address (typically `0x3C`).
    /// * `delay`: delay provider used for the power-up settle time.
    pub fn new(address: u8, delay: D) -> Self {
        Self {
            address,
            delay,
            state: DisplayState::Uninitialized,
        }
    }

    /// Power up and configure the panel.
    ///
    /// Waits [`POWER_UP_SETTLE_MS`] for the supply rails, then sends every
    /// byte of [`INIT_SEQUENCE`] in order.
    ///
    /// # Errors
    ///
    /// Returns [`OledError::I2c`] on the first failed write. The state is
    /// left at [`DisplayState::Initializing`] and the call may be retried.
    pub async fn initialize<I2C>(&mut self, i2c: &mut I2C) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        self.state = DisplayState::Initializing;
        self.delay.delay_ms(POWER_UP_SETTLE_MS).await;

        for &command in INIT_SEQUENCE.iter() {
            self.write_command(i2c, command).await?;
        }

        self.state = DisplayState::Ready;

        #[cfg(feature = "defmt")]
        defmt::info!("SSD1306 at {=u8:#x} initialised", self.address);

        Ok(())
    }

    /// Blank the whole panel. Equivalent to `fill(0x00)`.
    pub async fn clear<I2C>(&mut self, i2c: &mut I2C) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        self.fill(i2c, 0x00).await
    }

    /// Write `pattern` to all 1024 bytes of display RAM.
    ///
    /// `0xFF` lights every pixel, `0x00` blanks the panel, other values give
    /// horizontal stripes (each byte covers 8 vertical pixels).
    ///
    /// # Errors
    ///
    /// * [`OledError::InvalidState`] unless the panel is
    ///   [`Ready`](DisplayState::Ready).
    /// * [`OledError::I2c`] on a failed write. Bytes written before the
    ///   failure stay on the panel; re-issue the fill to recover.
    pub async fn fill<I2C>(
        &mut self,
        i2c: &mut I2C,
        pattern: u8,
    ) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.state != DisplayState::Ready {
            return Err(OledError::InvalidState(self.state));
        }

        for _ in 0..FRAME_BYTES {
            self.write_data(i2c, pattern).await?;
        }

        Ok(())
    }

    /// Write a caller-rendered [`Frame`] to display RAM, byte by byte.
    ///
    /// Same preconditions and failure behaviour as [`fill()`](Self::fill).
    pub async fn write_frame<I2C>(
        &mut self,
        i2c: &mut I2C,
        frame: &Frame,
    ) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.state != DisplayState::Ready {
            return Err(OledError::InvalidState(self.state));
        }

        for &byte in frame.as_bytes().iter() {
            self.write_data(i2c, byte).await?;
        }

        Ok(())
    }

    /// Set the panel contrast (`0x00`–`0xFF`, init default `0x80`).
    ///
    /// Accepted while the panel is on or off.
    pub async fn set_contrast<I2C>(
        &mut self,
        i2c: &mut I2C,
        level: u8,
    ) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        if !matches!(self.state, DisplayState::Ready | DisplayState::Off) {
            return Err(OledError::InvalidState(self.state));
        }

        self.write_command(i2c, SET_CONTRAST).await?;
        self.write_command(i2c, level).await?;
        Ok(())
    }

    /// Switch a [`Ready`](DisplayState::Ready) panel off. RAM is retained.
    pub async fn power_off<I2C>(&mut self, i2c: &mut I2C) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.state != DisplayState::Ready {
            return Err(OledError::InvalidState(self.state));
        }
        self.write_command(i2c, DISPLAY_OFF).await?;
        self.state = DisplayState::Off;
        Ok(())
    }

    /// Switch an [`Off`](DisplayState::Off) panel back on.
    pub async fn power_on<I2C>(&mut self, i2c: &mut I2C) -> Result<(), OledError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.state != DisplayState::Off {
            return Err(OledError::InvalidState(self.state));
        }
        self.write_command(i2c, DISPLAY_ON).await?;
        self.state = DisplayState::Ready;
        Ok(())
    }

    /// Best-effort power down used when the peripheral is detached.
    ///
    /// Sends display-off and then blanks RAM. Bus errors are logged and
    /// swallowed; the state always ends at [`DisplayState::Off`]. A
    /// controller that never saw `initialize()` is left untouched.
    pub async fn shutdown<I2C>(&mut self, i2c: &mut I2C)
    where
        I2C: I2c,
    {
        if self.state == DisplayState::Uninitialized {
            return;
        }

        if self.write_command(i2c, DISPLAY_OFF).await.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("SSD1306 display-off failed during shutdown");
        }

        for _ in 0..FRAME_BYTES {
            if self.write_data(i2c, 0x00).await.is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("SSD1306 blanking failed during shutdown");
                break;
            }
        }

        self.state = DisplayState::Off;
    }

    /// Current lifecycle state. No I2C traffic.
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// `true` once the panel is initialised and on.
    pub fn is_ready(&self) -> bool {
        self.state == DisplayState::Ready
    }

    /// The 7-bit address this controller talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    // -----------------------------------------------------------------------
    // Wire primitives
    // -----------------------------------------------------------------------

    async fn write_command<I2C>(&self, i2c: &mut I2C, command: u8) -> Result<(), I2C::Error>
    where
        I2C: I2c,
    {
        i2c.write(self.address, &[CONTROL_COMMAND, command]).await
    }

    async fn write_data<I2C>(&self, i2c: &mut I2C, byte: u8) -> Result<(), I2C::Error>
    where
        I2C: I2c,
    {
        i2c.write(self.address, &[CONTROL_DATA, byte]).await
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
