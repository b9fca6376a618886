//! SSD1306 command bytes and protocol constants.
//!
//! Every byte on the wire is preceded by a control byte that selects how the
//! controller interprets it:
//! - `0x00`: the following byte is a command
//! - `0x40`: the following byte is written to display RAM
//!
//! The driver sends each byte as its own `{control, value}` transaction.

// ---------------------------------------------------------------------------
// Control bytes
// ---------------------------------------------------------------------------

/// Control byte announcing a command byte (Co = 0, D/C# = 0).
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte announcing a display RAM byte (Co = 0, D/C# = 1).
pub const CONTROL_DATA: u8 = 0x40;

// ---------------------------------------------------------------------------
// Commands used outside the init table
// ---------------------------------------------------------------------------

/// Panel off (sleep mode).
pub const DISPLAY_OFF: u8 = 0xAE;

/// Panel on.
pub const DISPLAY_ON: u8 = 0xAF;

/// Set contrast; the next command byte is the level.
pub const SET_CONTRAST: u8 = 0x81;

// ---------------------------------------------------------------------------
// Initialisation table
// ---------------------------------------------------------------------------

/// Power-up configuration for a 128×64 panel with the internal charge pump.
///
/// Sent in order, one command byte per transaction, after
/// [`POWER_UP_SETTLE_MS`].
pub const INIT_SEQUENCE: [u8; 26] = [
    DISPLAY_OFF,
    0xD5, 0x80, // clock divide ratio / oscillator frequency
    0xA8, 0x3F, // multiplex ratio: 64 lines
    0xD3, 0x00, // display offset: none
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing mode
    0xA1,       // segment remap: column 127 -> SEG0
    0xC8,       // COM scan direction remapped
    0xDA, 0x12, // COM pins: alternative, no left/right remap
    SET_CONTRAST, 0x80,
    0xD9, 0xF1, // pre-charge period
    0xDB, 0x20, // VCOMH deselect level
    0xA4,       // display follows RAM
    0xA6,       // normal (non-inverted)
    0x2E,       // scrolling off
    DISPLAY_ON,
];

// ---------------------------------------------------------------------------
// Geometry and timing
// ---------------------------------------------------------------------------

/// Panel width in pixels.
pub const WIDTH: usize = 128;

/// Panel height in pixels.
pub const HEIGHT: usize = 64;

/// Bytes of display RAM for one full 1-bpp frame.
pub const FRAME_BYTES: usize = WIDTH * HEIGHT / 8;

/// Power rail settle time before the init table is sent.
pub const POWER_UP_SETTLE_MS: u32 = 100;

/// Default I2C address (SA0 low).
pub const DEFAULT_ADDRESS: u8 = 0x3C;
