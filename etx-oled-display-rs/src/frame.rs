//! Caller-owned frame buffer in SSD1306 RAM order.
//!
//! The driver never keeps a frame between calls. Callers that want to draw
//! text or shapes render into a [`Frame`] with `embedded-graphics` and hand
//! it to [`DisplayController::write_frame()`](crate::DisplayController::write_frame).

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::commands::{FRAME_BYTES, HEIGHT, WIDTH};

/// One full 128×64 1-bpp frame, 1024 bytes.
///
/// Layout matches horizontal addressing mode: byte `(y / 8) * 128 + x`
/// holds the column of 8 pixels starting at page `y / 8`, with bit `y % 8`
/// (LSB at the top).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_BYTES],
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// A blank frame (all pixels off).
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; FRAME_BYTES],
        }
    }

    /// A frame with every byte set to `pattern`.
    pub const fn filled(pattern: u8) -> Self {
        Self {
            bytes: [pattern; FRAME_BYTES],
        }
    }

    /// Raw RAM bytes in transmission order.
    pub fn as_bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.bytes
    }

    /// Mutable access to the raw RAM bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; FRAME_BYTES] {
        &mut self.bytes
    }

    /// Turn every pixel off.
    pub fn blank(&mut self) {
        self.bytes = [0u8; FRAME_BYTES];
    }

    /// Read back a single pixel. Out-of-range coordinates read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.bytes[Self::index(x, y)] & (1 << (y % 8)) != 0
    }

    /// Number of lit pixels.
    pub fn lit_pixels(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let index = Self::index(x, y);
        let mask = 1 << (y % 8);
        if on {
            self.bytes[index] |= mask;
        } else {
            self.bytes[index] &= !mask;
        }
    }

    fn index(x: usize, y: usize) -> usize {
        (y / 8) * WIDTH + x
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Clip silently; embedded-graphics may hand us off-screen pixels.
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x >= WIDTH || y >= HEIGHT {
                continue;
            }
            self.set_pixel(x, y, color.is_on());
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
