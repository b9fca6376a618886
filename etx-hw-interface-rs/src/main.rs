//! etx-hw-interface
//!
//! SSD1306 display + AHT20 sensor firmware for the Raspberry Pi Pico 2.
//! Both peripherals hang off I2C1 and are owned by one
//! `PeripheralRegistry`:
//!
//! 1. At boot every selected peripheral is attached and the panel is
//!    cleared.
//! 2. The readout task wakes every `ReadoutConfig::period_ms`, issues a
//!    `ReadSensor` request through the control surface and logs the result.
//! 3. The measurement is rendered into a `Frame` and pushed to the panel.
//!
//! Display and sensor sequences are serialised by the registry lock; a failed
//! operation on one peripheral never stops the other.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Timer;
use embedded_hal_async::delay::DelayNs;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use etx_oled_display_rs::Frame;
use etx_peripherals::{
    render_measurement, ControlSurface, Peripheral, PeripheralRegistry, PeripheralSelection,
    ReadoutConfig, RegistryConfig, Request, Response, SensorReading, I2C_BUS_INDEX,
};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the I2C1 peripheral interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
});

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Active peripherals: 0 = both, 1 = display only, 2 = sensor only.
const SELECT_DEVICE: u8 = 0;

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

/// Copyable async delay backed by the embassy time driver. Each controller
/// gets its own copy.
#[derive(Clone, Copy)]
struct TimerDelay;

impl DelayNs for TimerDelay {
    async fn delay_ns(&mut self, ns: u32) {
        Timer::after_nanos(ns as u64).await;
    }

    async fn delay_us(&mut self, us: u32) {
        Timer::after_micros(us as u64).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await;
    }
}

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

type Bus = I2c<'static, I2C1, i2c::Async>;
type Registry = PeripheralRegistry<CriticalSectionRawMutex, Bus, TimerDelay>;

/// Owner of I2C1 and both controllers for the lifetime of the firmware.
static REGISTRY: StaticCell<Registry> = StaticCell::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Periodic measure → log → render loop.
///
/// In sensor-only mode the readings are only logged.
#[embassy_executor::task]
async fn readout_task(registry: &'static Registry, config: ReadoutConfig) {
    info!("Readout task started ({} ms period)", config.period_ms);

    let surface = ControlSurface::new(registry);
    let mut frame = Frame::new();

    loop {
        Timer::after_millis(config.period_ms).await;

        let measurement = match surface.handle(Request::ReadSensor).await {
            Ok(Response::Measurement(m)) => m,
            Ok(Response::Done) => continue,
            Err(e) => {
                warn!("Sensor read failed: {}", e);
                continue;
            }
        };

        let reading = SensorReading::from(measurement);
        info!(
            "Temperature: {} (0.1 C), humidity: {} (0.1 %RH)",
            reading.temperature, reading.humidity
        );

        if !registry.is_active(Peripheral::Display) {
            continue;
        }

        frame.blank();
        // Frame drawing is infallible.
        let _ = render_measurement(&mut frame, &measurement, &config);
        if let Err(e) = registry.display_frame(&frame).await {
            warn!("Display update failed: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("etx-hw-interface starting");

    // ── Pin assignments ────────────────────────────────────────────────────
    // I2C1_SDA → GP2  (p.PIN_2)
    // I2C1_SCL → GP3  (p.PIN_3)
    // ───────────────────────────────────────────────────────────────────────

    let i2c = I2c::new_async(
        p.I2C1,
        p.PIN_3, // SCL
        p.PIN_2, // SDA
        Irqs,
        i2c::Config::default(),
    );
    info!("I2C bus {} ready", I2C_BUS_INDEX);

    let selection = match PeripheralSelection::try_from(SELECT_DEVICE) {
        Ok(selection) => selection,
        Err(e) => {
            warn!("{}; falling back to both peripherals", e);
            PeripheralSelection::Both
        }
    };

    let registry = match PeripheralRegistry::new(
        i2c,
        TimerDelay,
        RegistryConfig::with_selection(selection),
    ) {
        Ok(registry) => REGISTRY.init(registry),
        Err(e) => {
            error!("Invalid peripheral configuration: {}", e);
            return;
        }
    };

    // ── Attach ────────────────────────────────────────────────────────────

    // Failures are logged per peripheral; the survivor keeps working.
    if let Err(e) = registry.attach_all().await {
        error!("Attach failed: {}", e);
    }

    if registry.is_active(Peripheral::Display) {
        if let Err(e) = registry.display_clear().await {
            warn!("Initial clear failed: {}", e);
        }
    }

    // ── Spawn tasks ────────────────────────────────────────────────────────

    if registry.is_active(Peripheral::Sensor) {
        spawner.spawn(unwrap!(readout_task(registry, ReadoutConfig::default())));
        info!("Readout task spawned");
    } else {
        info!("Sensor inactive; display stays blank");
    }
}
