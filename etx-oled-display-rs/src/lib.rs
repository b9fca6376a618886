//! Async byte-protocol driver for the SSD1306 (128×64) OLED.
//!
//! This crate provides [`DisplayController`], which owns the panel state
//! machine and speaks the SSD1306 control-byte protocol one two-byte
//! transaction at a time, and [`Frame`], a caller-owned frame buffer that
//! `embedded-graphics` can draw into.
//!
//! The controller borrows the bus per operation instead of owning it, so a
//! registry can lend one shared I2C transport to several peripherals and
//! hold it for a whole 1024-byte fill.
//!
//! # Quick Start
//!
//! ```ignore
//! use etx_oled_display_rs::{DisplayController, DEFAULT_ADDRESS};
//!
//! let mut oled = DisplayController::new(DEFAULT_ADDRESS, embassy_time::Delay);
//! oled.initialize(&mut i2c).await?;
//! oled.clear(&mut i2c).await?;
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`] and `defmt::Format`
//!   implementations on the public types.

#![cfg_attr(not(test), no_std)]

pub mod commands;
pub mod driver;
pub mod error;
pub mod frame;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use commands::{DEFAULT_ADDRESS, FRAME_BYTES, INIT_SEQUENCE};
pub use driver::{DisplayController, DisplayState};
pub use error::OledError;
pub use frame::Frame;
