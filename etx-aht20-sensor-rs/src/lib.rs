//! Async driver for the AHT20 temperature and humidity sensor.
//!
//! # Architecture
//!
//! The crate is split into three layers:
//!
//! - **`driver`** (crate-private): the three-byte command write and the
//!   six-byte frame read.
//! - **[`measurement`]**: bit unpacking of the raw frame and the linear
//!   fixed-point conversion to tenths of a unit.
//! - **[`SensorController`]** (public): the trigger → settle → read state
//!   machine with precondition checks.
//!
//! # Quick start
//!
//! ```ignore
//! use aht20_driver::{SensorController, DEFAULT_ADDRESS};
//!
//! let mut sensor = SensorController::new(DEFAULT_ADDRESS, embassy_time::Delay);
//! sensor.initialize(&mut i2c).await?;
//! let reading = sensor.measure(&mut i2c).await?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: Enable [`defmt::Format`] implementations on the public
//!   types and driver logging.

#![cfg_attr(not(test), no_std)]

pub use commands::{DEFAULT_ADDRESS, MEASUREMENT_SETTLE_MS};
pub use error::SensorError;
pub use measurement::{Measurement, RawMeasurement};
pub use sensor::{SensorController, SensorState};

pub mod commands;
mod driver;
mod error;
pub mod measurement;
mod sensor;
