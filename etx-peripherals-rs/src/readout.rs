//! Text readout of a sensor measurement.
//!
//! The firmware renders into a [`Frame`](etx_oled_display_rs::Frame) and
//! pushes it with
//! [`PeripheralRegistry::display_frame()`](crate::PeripheralRegistry::display_frame).

use core::fmt::Write;

use aht20_driver::measurement::write_tenths;
use aht20_driver::Measurement;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Alignment, Text},
};
use heapless::String;

/// Capacity of one formatted readout line.
const LINE_CAPACITY: usize = 24;

// ── ReadoutConfig ────────────────────────────────────────────────────────

/// Geometry and refresh period of the readout.
///
/// [`ReadoutConfig::default()`] centres two lines on a 128×64 panel and
/// refreshes every two seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadoutConfig {
    /// Time between readings in milliseconds. Default: 2000.
    pub period_ms: u64,
    /// Display width in pixels. Default: 128.
    pub display_width: u32,
    /// Baseline of the temperature line. Default: 24.
    pub temperature_y: i32,
    /// Baseline of the humidity line. Default: 44.
    pub humidity_y: i32,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            period_ms: 2000,
            display_width: 128,
            temperature_y: 24,
            humidity_y: 44,
        }
    }
}

// ── Formatting ───────────────────────────────────────────────────────────

/// Format `"{label} {value} {unit}"` with `value` in tenths.
pub fn format_line(label: &str, tenths: i32, unit: &str) -> String<LINE_CAPACITY> {
    let mut line = String::new();
    // Longest possible line ("Hum -214748364.8 %RH") fits the capacity.
    let _ = write!(line, "{} ", label);
    let _ = write_tenths(&mut line, tenths);
    let _ = write!(line, " {}", unit);
    line
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Draw `measurement` as two centred text lines.
///
/// ```text
/// ┌────────────────────────────┐
/// │                            │
/// │       Temp 23.5 C          │  ← temperature_y
/// │                            │
/// │       Hum 45.2 %RH         │  ← humidity_y
/// └────────────────────────────┘
/// ```
///
/// The target is not cleared first.
pub fn render_measurement<T>(
    target: &mut T,
    measurement: &Measurement,
    config: &ReadoutConfig,
) -> Result<(), T::Error>
where
    T: DrawTarget<Color = BinaryColor>,
{
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let centre_x = config.display_width as i32 / 2;

    let temperature = format_line("Temp", measurement.temperature_tenths_c, "C");
    Text::with_alignment(
        temperature.as_str(),
        Point::new(centre_x, config.temperature_y),
        text_style,
        Alignment::Center,
    )
    .draw(target)?;

    let humidity = format_line("Hum", measurement.humidity_tenths_pct, "%RH");
    Text::with_alignment(
        humidity.as_str(),
        Point::new(centre_x, config.humidity_y),
        text_style,
        Alignment::Center,
    )
    .draw(target)?;

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use etx_oled_display_rs::Frame;

    fn reading(temperature_tenths_c: i32, humidity_tenths_pct: i32) -> Measurement {
        Measurement {
            temperature_tenths_c,
            humidity_tenths_pct,
        }
    }

    #[test]
    fn default_config_values() {
        let c = ReadoutConfig::default();
        assert_eq!(c.period_ms, 2000);
        assert_eq!(c.display_width, 128);
        assert_eq!(c.temperature_y, 24);
        assert_eq!(c.humidity_y, 44);
    }

    #[test]
    fn lines_are_formatted_in_tenths() {
        assert_eq!(format_line("Temp", 235, "C").as_str(), "Temp 23.5 C");
        assert_eq!(format_line("Hum", 452, "%RH").as_str(), "Hum 45.2 %RH");
        assert_eq!(format_line("Temp", -5, "C").as_str(), "Temp -0.5 C");
        assert_eq!(
            format_line("Hum", i32::MIN, "%RH").as_str(),
            "Hum -214748364.8 %RH"
        );
    }

    #[test]
    fn render_draws_only_inside_the_two_text_rows() {
        let config = ReadoutConfig::default();
        let mut frame = Frame::new();
        render_measurement(&mut frame, &reading(235, 452), &config).unwrap();

        assert!(frame.lit_pixels() > 0);

        let in_row = |y: i32, baseline: i32| y >= baseline - 10 && y <= baseline + 3;
        for y in 0..64 {
            for x in 0..128 {
                if frame.pixel(x, y) {
                    let y = y as i32;
                    assert!(
                        in_row(y, config.temperature_y) || in_row(y, config.humidity_y),
                        "stray pixel at ({}, {})",
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn different_readings_render_differently() {
        let config = ReadoutConfig::default();

        let mut a = Frame::new();
        render_measurement(&mut a, &reading(235, 452), &config).unwrap();
        let mut b = Frame::new();
        render_measurement(&mut b, &reading(236, 452), &config).unwrap();
        let mut c = Frame::new();
        render_measurement(&mut c, &reading(235, 452), &config).unwrap();

        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
