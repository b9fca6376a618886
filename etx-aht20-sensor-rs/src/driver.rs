//! Low-level AHT20 wire primitives.
//!
//! This module is crate-private: consumers interact with
//! [`SensorController`](crate::SensorController) instead.

use embedded_hal_async::i2c::I2c;

use crate::commands::MEASUREMENT_LEN;
use crate::measurement::RawMeasurement;

/// A borrowed view of the bus pointed at one AHT20.
///
/// Lives only for the duration of a single controller operation.
pub(crate) struct Aht20Bus<'a, I2C> {
    i2c: &'a mut I2C,
    address: u8,
}

impl<'a, I2C> Aht20Bus<'a, I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: &'a mut I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Send one three-byte command in a single write transaction.
    pub async fn send_command(&mut self, command: &[u8; 3]) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, command).await
    }

    /// Read the six-byte status + measurement frame.
    pub async fn read_measurement(&mut self) -> Result<RawMeasurement, I2C::Error> {
        let mut buf = [0u8; MEASUREMENT_LEN];
        self.i2c.read(self.address, &mut buf).await?;
        Ok(RawMeasurement::new(buf))
    }
}
