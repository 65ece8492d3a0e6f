#![no_std]
//! Driver to write characters to LCD and OLED character displays connected via i2c. Two
//! controller families are supported:
//!
//! * HD44780 compatible LCDs behind a PCF8574 i/o expander backpack (4 bit interface, the
//!   backlight is driven by a pin of the expander),
//! * US2066 compatible OLEDs which speak i2c natively (e.g. the Newhaven character OLEDs).
//!
//! The display family is chosen when the driver is created, it never changes afterwards. The
//! driver borrows a [`Bus`] (every [`embedded_hal::i2c::I2c`] is one) and a delay implementing
//! [`embedded_hal::delay::DelayNs`].
//!
//! Usage:
//! ```ignore
//! use i2c_char_display::{CharDisplay, DisplayFamily, OLED_PRIMARY_ADDRESS};
//!
//! // `i2c` implements embedded_hal::i2c::I2c, `delay` embedded_hal::delay::DelayNs.
//! let mut oled = CharDisplay::new(&mut i2c, &mut delay, DisplayFamily::Oled, OLED_PRIMARY_ADDRESS, 4);
//! oled.begin()?;
//! oled.write_str("hello")?;
//! oled.cursor_move(2, 1)?;
//! oled.set_brightness(128)?;
//! ufmt::uwrite!(oled, "{} rpm", 3200u16)?;
//! ```
//!
//! Boards with two i2c interfaces can wrap them in a [`DualBus`] and pick one per display with
//! [`CharDisplay::with_channel`].
//!
//! The bus protocol is write-only, so the driver mirrors the display control and entry mode
//! registers. Out-of-range arguments (rows, CGRAM slots, fade rates) are clamped or masked, never
//! rejected. Errors reported by the bus are handed back to the caller.

pub mod bus;
pub mod config;
mod protocol;
pub mod sync_display;

#[cfg(feature = "async")]
pub mod async_display;

pub use bus::{Bus, DualBus, DualBusError};
pub use config::{
    BusChannel, DisplayConfig, LCD_DEFAULT_ADDRESS, MAX_ROWS, OLED_PRIMARY_ADDRESS,
    OLED_SECONDARY_ADDRESS,
};
pub use sync_display::CharDisplay;

#[cfg(feature = "async")]
pub use bus::AsyncBus;

/// Controller family of a display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayFamily {
    /// HD44780 LCD behind a PCF8574 i/o expander.
    Lcd,
    /// US2066 OLED with native i2c.
    Oled,
}

/// Bits of the display control register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayControl {
    Off = 0x00,
    CursorBlink = 0x01,
    CursorOn = 0x02,
    DisplayOn = 0x04,
}

/// Bits of the entry mode register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryMode {
    RightToLeft = 0x00,
    ShiftOnWrite = 0x01,
    LeftToRight = 0x02,
}

/// LCD backlight, a pin of the i/o expander.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backlight {
    Off = 0x00,
    On = 0x08,
}

/// Instruction opcodes shared by both controller families.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum Instruction {
    Clear = 0x01,
    EntryModeSet = 0x04,
    DisplayControl = 0x08,
    Shift = 0x10,
    FunctionSet = 0x20,
    CgramAddr = 0x40,
    DdramAddr = 0x80,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum ShiftTarget {
    Cursor = 0x00,
    Display = 0x08,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum ShiftDirection {
    Left = 0x00,
    Right = 0x04,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum BitMode {
    Bit4 = 0x00,
    Bit8 = 0x10,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum Lines {
    One = 0x00,
    Two = 0x08,
}

/// Register select and enable pins on the PCF8574 expander.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum Register {
    Command = 0x00,
    Data = 0x01,
}

const LCD_ENABLE: u8 = 0x04;

/// Control byte preceding every byte sent to the US2066.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum OledControl {
    Command = 0x80,
    Data = 0x40,
}

/// US2066 fade out modes, the low nibble carries the rate.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
enum Fade {
    Off = 0x00,
    Once = 0x20,
    Blink = 0x30,
}

const OLED_SET_CONTRAST: u8 = 0x81;
const OLED_SET_FADE: u8 = 0x23;
