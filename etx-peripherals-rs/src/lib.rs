//! Shared-bus ownership for an SSD1306 display and an AHT20 sensor.
//!
//! # Architecture
//!
//! - **[`config`]**: which peripherals are active and their addresses.
//! - **[`PeripheralRegistry`]**: owns the bus and both controllers behind
//!   one async mutex. Every operation holds the lock for its whole device
//!   sequence, so display and sensor traffic never interleave.
//! - **[`ControlSurface`]**: clear / fill / read-sensor requests, typed or
//!   by numeric command code.
//! - **[`readout`]**: renders a measurement as text into any
//!   `embedded-graphics` draw target.
//!
//! # Quick start
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use etx_peripherals::{ControlSurface, PeripheralRegistry, RegistryConfig};
//!
//! let registry: PeripheralRegistry<CriticalSectionRawMutex, _, _> =
//!     PeripheralRegistry::new(i2c, embassy_time::Delay, RegistryConfig::default())?;
//! registry.attach_all().await?;
//!
//! let surface = ControlSurface::new(&registry);
//! surface.clear().await?;
//! let reading = surface.read_sensor().await?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: Enable [`defmt::Format`] implementations and logging in
//!   this crate and both driver crates.

#![cfg_attr(not(test), no_std)]

pub use config::{
    ConfigError, Peripheral, PeripheralSelection, RegistryConfig, I2C_BUS_INDEX,
};
pub use control::{ControlError, ControlSurface, Request, Response, SensorReading};
pub use error::{DeviceState, PeripheralError};
pub use readout::{render_measurement, ReadoutConfig};
pub use registry::PeripheralRegistry;

pub mod config;
pub mod control;
mod error;
pub mod readout;
mod registry;
