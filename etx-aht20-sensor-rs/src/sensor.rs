//! High-level interface for the AHT20.
//!
//! [`SensorController`] owns the trigger → settle → read state machine and
//! refuses out-of-sequence calls instead of decoding a stale frame.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::commands::{CMD_INITIALIZE, CMD_TRIGGER_MEASUREMENT, INIT_SETTLE_MS, MEASUREMENT_SETTLE_MS};
use crate::driver::Aht20Bus;
use crate::error::SensorError;
use crate::measurement::Measurement;

/// Measurement cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorState {
    /// No conversion pending.
    #[default]
    Idle,
    /// Trigger sent; a read is valid once the conversion time has passed.
    Triggered,
    /// Frame read, being decoded. Only observable between the read and the
    /// return to `Idle`.
    Ready,
    /// The last `initialize()` failed. Only a successful `initialize()`
    /// leaves this state.
    Fault,
}

/// Driver for an AHT20 temperature/humidity sensor.
///
/// Like the display controller it borrows the bus per call, so the caller
/// controls serialisation with other devices on the same bus.
///
/// # Example
///
/// ```no_run
/// use aht20_driver::{SensorController, DEFAULT_ADDRESS};
///
/// # async fn example(
/// #     mut i2c: impl embedded_hal_async::i2c::I2c,
/// #     delay: impl embedded_hal_async::delay::DelayNs,
/// # ) {
/// let mut sensor = SensorController::new(DEFAULT_ADDRESS, delay);
/// sensor.initialize(&mut i2c).await.unwrap();
///
/// let reading = sensor.measure(&mut i2c).await.unwrap();
/// let celsius_tenths = reading.temperature_tenths_c;
/// # }
/// ```
pub struct SensorController<D> {
    address: u8,
    delay: D,
    state: SensorState,
    /// Set to `true` after a successful `initialize()` call.
    initialized: bool,
}

impl<D> SensorController<D>
where
    D: DelayNs,
{
    /// Create a new sensor interface. No I2C traffic is generated.
    ///
    /// # Arguments
    /// * `address`: 7-bit I2C device address (the AHT20 is fixed at 0x38)
    /// * `delay`: delay provider for the init and conversion waits
    pub fn new(address: u8, delay: D) -> Self {
        Self {
            address,
            delay,
            state: SensorState::Idle,
            initialized: false,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Send the initialisation command and wait for it to take effect.
    ///
    /// # Errors
    /// [`SensorError::I2c`] if the command write fails; the controller is
    /// then in [`SensorState::Fault`] until a later call succeeds.
    pub async fn initialize<I2C>(&mut self, i2c: &mut I2C) -> Result<(), SensorError<I2C::Error>>
    where
        I2C: I2c,
    {
        let mut bus = Aht20Bus::new(i2c, self.address);

        if let Err(e) = bus.send_command(&CMD_INITIALIZE).await {
            #[cfg(feature = "defmt")]
            defmt::error!("AHT20 initialisation failed");
            self.state = SensorState::Fault;
            self.initialized = false;
            return Err(SensorError::I2c(e));
        }

        self.delay.delay_ms(INIT_SETTLE_MS).await;
        self.state = SensorState::Idle;
        self.initialized = true;

        #[cfg(feature = "defmt")]
        defmt::info!("AHT20 at {=u8:#x} initialised", self.address);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Measurement cycle
    // -----------------------------------------------------------------------

    /// Start a conversion.
    ///
    /// # Errors
    /// * [`SensorError::NotInitialized`] before a successful `initialize()`
    /// * [`SensorError::InvalidState`] unless the controller is `Idle`
    /// * [`SensorError::I2c`] on write failure (state stays `Idle`)
    pub async fn trigger_measurement<I2C>(
        &mut self,
        i2c: &mut I2C,
    ) -> Result<(), SensorError<I2C::Error>>
    where
        I2C: I2c,
    {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }
        if self.state != SensorState::Idle {
            return Err(SensorError::InvalidState(self.state));
        }

        Aht20Bus::new(i2c, self.address)
            .send_command(&CMD_TRIGGER_MEASUREMENT)
            .await?;
        self.state = SensorState::Triggered;
        Ok(())
    }

    /// Wait out the conversion time, read the frame and decode it.
    ///
    /// Single-shot: the controller returns to `Idle` and a new trigger is
    /// needed for the next reading.
    ///
    /// # Errors
    /// * [`SensorError::InvalidState`] unless a trigger is pending; no bus
    ///   traffic is generated in that case
    /// * [`SensorError::I2c`] on read failure (state resets to `Idle`)
    pub async fn read_measurement<I2C>(
        &mut self,
        i2c: &mut I2C,
    ) -> Result<Measurement, SensorError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.state != SensorState::Triggered {
            return Err(SensorError::InvalidState(self.state));
        }

        self.delay.delay_ms(MEASUREMENT_SETTLE_MS).await;

        let raw = match Aht20Bus::new(i2c, self.address).read_measurement().await {
            Ok(raw) => raw,
            Err(e) => {
                self.state = SensorState::Idle;
                return Err(SensorError::I2c(e));
            }
        };
        self.state = SensorState::Ready;

        if raw.is_busy() {
            #[cfg(feature = "defmt")]
            defmt::warn!("AHT20 still busy after {} ms", MEASUREMENT_SETTLE_MS);
        }

        let measurement = Measurement::from(raw);
        self.state = SensorState::Idle;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "AHT20: T = {} tenths C, RH = {} tenths %",
            measurement.temperature_tenths_c,
            measurement.humidity_tenths_pct
        );

        Ok(measurement)
    }

    /// Trigger a conversion and read it back: the complete unit of work.
    ///
    /// A trigger left pending by an abandoned cycle (a dropped future) is
    /// discarded; the sensor accepts a fresh trigger at any time.
    pub async fn measure<I2C>(&mut self, i2c: &mut I2C) -> Result<Measurement, SensorError<I2C::Error>>
    where
        I2C: I2c,
    {
        if self.initialized && self.state == SensorState::Triggered {
            #[cfg(feature = "defmt")]
            defmt::warn!("AHT20: discarding pending trigger");
            self.state = SensorState::Idle;
        }

        self.trigger_measurement(i2c).await?;
        self.read_measurement(i2c).await
    }

    // -----------------------------------------------------------------------
    // Queries (no I2C traffic)
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
