//! Ownership of the shared bus and the lending discipline around it.
//!
//! [`PeripheralRegistry`] owns the I2C transport together with both device
//! controllers inside a single async [`Mutex`]. Every public operation takes
//! the lock once and keeps it for the complete device sequence, so a
//! 1024-byte fill and a trigger/wait/read cycle can never interleave on the
//! wire even though they target different addresses.

use aht20_driver::{Measurement, SensorController, SensorState};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use etx_oled_display_rs::{DisplayController, DisplayState, Frame};

use crate::config::{ConfigError, Peripheral, RegistryConfig};
use crate::error::PeripheralError;

/// Everything that lives behind the bus lock.
struct Attached<BUS, D> {
    bus: BUS,
    display: Option<DisplayController<D>>,
    sensor: Option<SensorController<D>>,
}

impl<BUS, D> Attached<BUS, D>
where
    BUS: I2c,
    D: DelayNs,
{
    /// Split the borrow into the bus and the display controller.
    #[allow(clippy::type_complexity)]
    fn display(
        &mut self,
    ) -> Result<(&mut BUS, &mut DisplayController<D>), PeripheralError<BUS::Error>> {
        match self.display.as_mut() {
            Some(display) => Ok((&mut self.bus, display)),
            None => Err(PeripheralError::DeviceNotPresent(Peripheral::Display)),
        }
    }

    /// Split the borrow into the bus and the sensor controller.
    #[allow(clippy::type_complexity)]
    fn sensor(
        &mut self,
    ) -> Result<(&mut BUS, &mut SensorController<D>), PeripheralError<BUS::Error>> {
        match self.sensor.as_mut() {
            Some(sensor) => Ok((&mut self.bus, sensor)),
            None => Err(PeripheralError::DeviceNotPresent(Peripheral::Sensor)),
        }
    }
}

/// Owner of the shared bus and of the controllers attached to it.
///
/// # Lifecycle
///
/// 1. [`PeripheralRegistry::new()`]: validates the configuration and
///    constructs a controller for each active peripheral. No bus traffic.
/// 2. [`attach()`](Self::attach) / [`attach_all()`](Self::attach_all): runs
///    each controller's initialisation sequence.
/// 3. Device operations, from any number of callers sharing `&self`.
/// 4. [`detach()`](Self::detach): best-effort display shutdown, then the bus
///    is handed back.
///
/// `M` selects the raw mutex: `CriticalSectionRawMutex` when callers run in
/// different executors or interrupt priorities, `NoopRawMutex` when all of
/// them share one executor.
pub struct PeripheralRegistry<M, BUS, D>
where
    M: RawMutex,
{
    inner: Mutex<M, Attached<BUS, D>>,
    config: RegistryConfig,
}

impl<M, BUS, D> PeripheralRegistry<M, BUS, D>
where
    M: RawMutex,
    BUS: I2c,
    D: DelayNs + Clone,
{
    /// Take ownership of `bus` and build the controllers selected by `config`.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] if `config` fails validation.
    pub fn new(bus: BUS, delay: D, config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let display = config
            .selection
            .includes(Peripheral::Display)
            .then(|| DisplayController::new(config.display_address, delay.clone()));
        let sensor = config
            .selection
            .includes(Peripheral::Sensor)
            .then(|| SensorController::new(config.sensor_address, delay));

        Ok(Self {
            inner: Mutex::new(Attached {
                bus,
                display,
                sensor,
            }),
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Attach / detach
    // -----------------------------------------------------------------------

    /// Run the initialisation sequence of one peripheral.
    ///
    /// Attaching the sensor only initialises it; the first reading is an
    /// explicit [`read_sensor()`](Self::read_sensor) call.
    pub async fn attach(&self, peripheral: Peripheral) -> Result<(), PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;

        match peripheral {
            Peripheral::Display => {
                let (bus, display) = attached.display()?;
                display.initialize(bus).await?;
            }
            Peripheral::Sensor => {
                let (bus, sensor) = attached.sensor()?;
                sensor.initialize(bus).await?;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::info!("{} attached", peripheral);

        Ok(())
    }

    /// Attach every active peripheral.
    ///
    /// A failure on one peripheral is logged and does not stop the other
    /// from being attached. Returns the first error encountered.
    pub async fn attach_all(&self) -> Result<(), PeripheralError<BUS::Error>> {
        let mut first_error = None;

        for peripheral in [Peripheral::Display, Peripheral::Sensor] {
            if !self.is_active(peripheral) {
                continue;
            }
            if let Err(e) = self.attach(peripheral).await {
                #[cfg(feature = "defmt")]
                defmt::error!("Attaching {} failed", peripheral);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Shut the display down (best effort) and release the bus.
    pub async fn detach(self) -> BUS {
        let mut attached = self.inner.into_inner();

        if let Some(display) = attached.display.as_mut() {
            display.shutdown(&mut attached.bus).await;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Peripherals detached");

        attached.bus
    }

    // -----------------------------------------------------------------------
    // Display operations
    // -----------------------------------------------------------------------

    /// Blank the panel (1024 × `0x00`) under one lock.
    pub async fn display_clear(&self) -> Result<(), PeripheralError<BUS::Error>> {
        self.display_fill(0x00).await
    }

    /// Write `pattern` to the whole panel under one lock.
    pub async fn display_fill(&self, pattern: u8) -> Result<(), PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;
        let (bus, display) = attached.display()?;
        display.fill(bus, pattern).await?;
        Ok(())
    }

    /// Write a rendered frame under one lock.
    pub async fn display_frame(&self, frame: &Frame) -> Result<(), PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;
        let (bus, display) = attached.display()?;
        display.write_frame(bus, frame).await?;
        Ok(())
    }

    /// Set the panel contrast.
    pub async fn display_contrast(&self, level: u8) -> Result<(), PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;
        let (bus, display) = attached.display()?;
        display.set_contrast(bus, level).await?;
        Ok(())
    }

    /// Switch the panel on or off without touching RAM.
    pub async fn display_power(&self, on: bool) -> Result<(), PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;
        let (bus, display) = attached.display()?;
        if on {
            display.power_on(bus).await?;
        } else {
            display.power_off(bus).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sensor operations
    // -----------------------------------------------------------------------

    /// Trigger, wait for the conversion and read, all under one lock.
    pub async fn read_sensor(&self) -> Result<Measurement, PeripheralError<BUS::Error>> {
        let mut attached = self.inner.lock().await;
        let (bus, sensor) = attached.sensor()?;
        Ok(sensor.measure(bus).await?)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `true` if `peripheral` was selected by the configuration.
    pub fn is_active(&self, peripheral: Peripheral) -> bool {
        self.config.selection.includes(peripheral)
    }

    /// Display lifecycle state, or `None` if the display is inactive.
    pub async fn display_state(&self) -> Option<DisplayState> {
        self.inner.lock().await.display.as_ref().map(|d| d.state())
    }

    /// Sensor cycle state, or `None` if the sensor is inactive.
    pub async fn sensor_state(&self) -> Option<SensorState> {
        self.inner.lock().await.sensor.as_ref().map(|s| s.state())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use embassy_futures::select::{select, Either};
    use embassy_futures::{block_on, yield_now};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    use crate::config::PeripheralSelection;
    use crate::error::DeviceState;

    pub const DISPLAY: u8 = 0x3C;
    pub const SENSOR: u8 = 0x38;

    /// One transfer as seen on the wire.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Write(u8, Vec<u8>),
        Read(u8, usize),
    }

    impl Event {
        pub fn address(&self) -> u8 {
            match self {
                Event::Write(a, _) | Event::Read(a, _) => *a,
            }
        }
    }

    /// Shared state of the simulated bus.
    pub struct Wire {
        pub events: Vec<Event>,
        /// Frames returned by successive reads.
        pub frames: VecDeque<[u8; 6]>,
        /// Transfers to this address fail with a NACK.
        pub failing: Option<u8>,
        /// Simulated SSD1306 RAM and its write pointer.
        pub ram: [u8; 1024],
        cursor: usize,
    }

    impl Default for Wire {
        fn default() -> Self {
            Self {
                events: Vec::new(),
                frames: VecDeque::new(),
                failing: None,
                ram: [0u8; 1024],
                cursor: 0,
            }
        }
    }

    /// Recording bus double. Yields to the executor before every transfer
    /// so that concurrent callers get a chance to interleave if the lock
    /// does not stop them.
    #[derive(Clone, Default)]
    pub struct RecordingBus(pub Rc<RefCell<Wire>>);

    impl RecordingBus {
        pub fn events(&self) -> Vec<Event> {
            self.0.borrow().events.clone()
        }

        pub fn push_frame(&self, frame: [u8; 6]) {
            self.0.borrow_mut().frames.push_back(frame);
        }

        pub fn fail_address(&self, address: Option<u8>) {
            self.0.borrow_mut().failing = address;
        }

        pub fn ram(&self) -> [u8; 1024] {
            self.0.borrow().ram
        }

        pub fn clear_events(&self) {
            self.0.borrow_mut().events.clear();
        }
    }

    impl ErrorType for RecordingBus {
        type Error = ErrorKind;
    }

    impl I2c for RecordingBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for operation in operations.iter_mut() {
                yield_now().await;

                let mut wire = self.0.borrow_mut();
                if wire.failing == Some(address) {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }

                match operation {
                    Operation::Write(bytes) => {
                        if address == DISPLAY && bytes.len() == 2 && bytes[0] == 0x40 {
                            let cursor = wire.cursor;
                            wire.ram[cursor] = bytes[1];
                            wire.cursor = (cursor + 1) % 1024;
                        }
                        wire.events.push(Event::Write(address, bytes.to_vec()));
                    }
                    Operation::Read(buffer) => {
                        let frame = wire.frames.pop_front().unwrap_or([0u8; 6]);
                        let len = buffer.len().min(frame.len());
                        buffer[..len].copy_from_slice(&frame[..len]);
                        wire.events.push(Event::Read(address, buffer.len()));
                    }
                }
            }
            Ok(())
        }
    }

    /// Delay that only yields. Settle waits become suspension points without
    /// slowing the tests down.
    #[derive(Clone, Copy, Default)]
    pub struct YieldDelay;

    impl DelayNs for YieldDelay {
        async fn delay_ns(&mut self, _ns: u32) {
            yield_now().await;
        }
    }

    pub type TestRegistry = PeripheralRegistry<NoopRawMutex, RecordingBus, YieldDelay>;

    pub const REFERENCE_FRAME: [u8; 6] = [0x00, 0x19, 0x99, 0x9A, 0x00, 0x00];

    pub fn registry(selection: PeripheralSelection) -> (TestRegistry, RecordingBus) {
        let bus = RecordingBus::default();
        let registry = PeripheralRegistry::new(
            bus.clone(),
            YieldDelay,
            RegistryConfig::with_selection(selection),
        )
        .unwrap();
        (registry, bus)
    }

    pub fn attached(selection: PeripheralSelection) -> (TestRegistry, RecordingBus) {
        let (registry, bus) = registry(selection);
        block_on(registry.attach_all()).unwrap();
        bus.clear_events();
        (registry, bus)
    }

    /// Number of contiguous same-address runs in an event log.
    pub fn address_runs(events: &[Event]) -> usize {
        let mut runs = 0;
        let mut last = None;
        for event in events {
            if last != Some(event.address()) {
                runs += 1;
                last = Some(event.address());
            }
        }
        runs
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_generates_no_traffic() {
        let (registry, bus) = registry(PeripheralSelection::Both);
        assert!(bus.events().is_empty());
        assert_eq!(block_on(registry.display_state()), Some(DisplayState::Uninitialized));
        assert_eq!(block_on(registry.sensor_state()), Some(SensorState::Idle));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = RegistryConfig {
            sensor_address: DISPLAY,
            ..RegistryConfig::default()
        };
        let result: Result<TestRegistry, _> =
            PeripheralRegistry::new(RecordingBus::default(), YieldDelay, config);
        assert!(matches!(result, Err(ConfigError::AddressConflict(DISPLAY))));
    }

    #[test]
    fn inactive_peripheral_is_never_constructed() {
        let (registry, _bus) = registry(PeripheralSelection::DisplayOnly);
        assert!(registry.is_active(Peripheral::Display));
        assert!(!registry.is_active(Peripheral::Sensor));
        assert_eq!(block_on(registry.sensor_state()), None);
    }

    // ── Attach ───────────────────────────────────────────────────────

    #[test]
    fn attach_all_initialises_without_reading_sensor() {
        let (registry, bus) = registry(PeripheralSelection::Both);
        block_on(registry.attach_all()).unwrap();

        let events = bus.events();
        let display_writes = events.iter().filter(|e| e.address() == DISPLAY).count();
        assert_eq!(display_writes, etx_oled_display_rs::INIT_SEQUENCE.len());
        assert_eq!(
            events.last(),
            Some(&Event::Write(SENSOR, vec![0xBE, 0x08, 0x00]))
        );
        assert!(!events.iter().any(|e| matches!(e, Event::Read(..))));

        assert_eq!(block_on(registry.display_state()), Some(DisplayState::Ready));
        assert_eq!(block_on(registry.sensor_state()), Some(SensorState::Idle));
    }

    #[test]
    fn attach_all_continues_past_a_failing_peripheral() {
        let (registry, bus) = registry(PeripheralSelection::Both);
        bus.fail_address(Some(DISPLAY));

        let result = block_on(registry.attach_all());
        assert_eq!(
            result,
            Err(PeripheralError::Transport {
                peripheral: Peripheral::Display,
                error: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            })
        );

        // The sensor attached regardless and is usable.
        bus.push_frame(REFERENCE_FRAME);
        let m = block_on(registry.read_sensor()).unwrap();
        assert_eq!(m.temperature_tenths_c, 750);
        assert_eq!(block_on(registry.display_state()), Some(DisplayState::Initializing));
    }

    #[test]
    fn attach_of_inactive_peripheral_is_not_present() {
        let (registry, bus) = registry(PeripheralSelection::SensorOnly);
        let result = block_on(registry.attach(Peripheral::Display));
        assert_eq!(result, Err(PeripheralError::DeviceNotPresent(Peripheral::Display)));
        assert!(bus.events().is_empty());
    }

    // ── Operations ───────────────────────────────────────────────────

    #[test]
    fn operations_before_attach_are_refused() {
        let (registry, bus) = registry(PeripheralSelection::Both);

        assert_eq!(
            block_on(registry.display_fill(0xFF)),
            Err(PeripheralError::InvalidState {
                peripheral: Peripheral::Display,
                state: DeviceState::Display(DisplayState::Uninitialized),
            })
        );
        assert_eq!(
            block_on(registry.read_sensor()),
            Err(PeripheralError::NotInitialized(Peripheral::Sensor))
        );
        assert!(bus.events().is_empty());
    }

    #[test]
    fn fill_then_clear_leaves_panel_blank() {
        let (registry, bus) = attached(PeripheralSelection::DisplayOnly);

        block_on(registry.display_fill(0xAA)).unwrap();
        assert!(bus.ram().iter().all(|&b| b == 0xAA));

        block_on(registry.display_fill(0x55)).unwrap();
        block_on(registry.display_clear()).unwrap();
        assert!(bus.ram().iter().all(|&b| b == 0x00));
        assert_eq!(bus.events().len(), 3 * 1024);
    }

    #[test]
    fn display_frame_lands_in_ram() {
        let (registry, bus) = attached(PeripheralSelection::DisplayOnly);

        let mut frame = Frame::new();
        frame.as_bytes_mut()[7] = 0x3C;
        block_on(registry.display_frame(&frame)).unwrap();
        assert_eq!(&bus.ram()[..], &frame.as_bytes()[..]);
    }

    #[test]
    fn display_power_and_contrast() {
        let (registry, bus) = attached(PeripheralSelection::DisplayOnly);

        block_on(registry.display_power(false)).unwrap();
        assert_eq!(block_on(registry.display_state()), Some(DisplayState::Off));
        assert_eq!(
            block_on(registry.display_clear()),
            Err(PeripheralError::InvalidState {
                peripheral: Peripheral::Display,
                state: DeviceState::Display(DisplayState::Off),
            })
        );

        block_on(registry.display_contrast(0x20)).unwrap();
        block_on(registry.display_power(true)).unwrap();

        assert_eq!(
            bus.events(),
            vec![
                Event::Write(DISPLAY, vec![0x00, 0xAE]),
                Event::Write(DISPLAY, vec![0x00, 0x81]),
                Event::Write(DISPLAY, vec![0x00, 0x20]),
                Event::Write(DISPLAY, vec![0x00, 0xAF]),
            ]
        );
    }

    #[test]
    fn read_sensor_is_trigger_then_read() {
        let (registry, bus) = attached(PeripheralSelection::SensorOnly);
        bus.push_frame(REFERENCE_FRAME);

        let m = block_on(registry.read_sensor()).unwrap();
        assert_eq!(m.humidity_tenths_pct, 99);
        assert_eq!(m.temperature_tenths_c, 750);
        assert_eq!(
            bus.events(),
            vec![
                Event::Write(SENSOR, vec![0xAC, 0x33, 0x00]),
                Event::Read(SENSOR, 6),
            ]
        );
    }

    #[test]
    fn excluded_peripheral_reports_not_present() {
        let (registry, bus) = attached(PeripheralSelection::DisplayOnly);
        assert_eq!(
            block_on(registry.read_sensor()),
            Err(PeripheralError::DeviceNotPresent(Peripheral::Sensor))
        );

        let (registry, _) = attached(PeripheralSelection::SensorOnly);
        assert_eq!(
            block_on(registry.display_fill(0xFF)),
            Err(PeripheralError::DeviceNotPresent(Peripheral::Display))
        );
        assert!(bus.events().is_empty());
    }

    #[test]
    fn display_failure_does_not_affect_sensor() {
        let (registry, bus) = attached(PeripheralSelection::Both);
        bus.fail_address(Some(DISPLAY));

        let result = block_on(registry.display_clear());
        assert!(matches!(
            result,
            Err(PeripheralError::Transport { peripheral: Peripheral::Display, .. })
        ));

        bus.push_frame(REFERENCE_FRAME);
        assert!(block_on(registry.read_sensor()).is_ok());
    }

    #[test]
    fn read_cancelled_during_settle_does_not_wedge_sensor() {
        let (registry, bus) = attached(PeripheralSelection::SensorOnly);

        // Drop the read after the trigger write, while it waits for the
        // conversion.
        let cancelled = block_on(select(registry.read_sensor(), async {
            yield_now().await;
            yield_now().await;
        }));
        assert!(matches!(cancelled, Either::Second(())));
        assert_eq!(
            bus.events(),
            vec![Event::Write(SENSOR, vec![0xAC, 0x33, 0x00])]
        );
        assert_eq!(block_on(registry.sensor_state()), Some(SensorState::Triggered));

        bus.push_frame(REFERENCE_FRAME);
        let m = block_on(registry.read_sensor()).unwrap();
        assert_eq!(m.temperature_tenths_c, 750);
        assert_eq!(block_on(registry.sensor_state()), Some(SensorState::Idle));

        bus.push_frame(REFERENCE_FRAME);
        assert!(block_on(registry.read_sensor()).is_ok());
    }

    // ── Detach ───────────────────────────────────────────────────────

    #[test]
    fn detach_blanks_display_and_returns_bus() {
        let (registry, bus) = attached(PeripheralSelection::Both);
        block_on(registry.display_fill(0xFF)).unwrap();
        bus.clear_events();

        let returned = block_on(registry.detach());

        let events = returned.events();
        assert_eq!(events[0], Event::Write(DISPLAY, vec![0x00, 0xAE]));
        assert_eq!(events.len(), 1 + 1024);
        assert!(returned.ram().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn detach_without_attach_is_silent() {
        let (registry, bus) = registry(PeripheralSelection::Both);
        block_on(registry.detach());
        assert!(bus.events().is_empty());
    }
}
