//! Byte level encoding shared by the blocking and the async driver.

use crate::{
    BitMode, DisplayControl, DisplayFamily, EntryMode, Instruction, Lines, OledControl, Register,
    LCD_ENABLE,
};

/// Hold time after raising and after dropping the LCD enable line.
pub(crate) const ENABLE_PULSE_US: u32 = 1;
/// Wait between the 8 bit mode pulses of the HD44780 reset, 4.1ms minimum.
pub(crate) const LCD_RESET_WAIT_US: u32 = 4300;
/// Settle time of the PCF8574 after its outputs are zeroed.
pub(crate) const LCD_EXPANDER_SETTLE_MS: u32 = 1000;
/// Power up wait of both controllers.
pub(crate) const POWER_UP_MS: u32 = 100;
/// Clear display takes 1.53ms on the HD44780, the US2066 is faster.
pub(crate) const CLEAR_SETTLE_US: u32 = 2000;
/// Applied after every US2066 command.
pub(crate) const OLED_COMMAND_SETTLE_MS: u32 = 10;

/// Display on, cursor off, blink off.
pub(crate) const DEFAULT_DISPLAY_CONTROL: u8 = DisplayControl::DisplayOn as u8;
/// Left to right, no shift on write.
pub(crate) const DEFAULT_ENTRY_MODE: u8 = EntryMode::LeftToRight as u8;

/// Upper nibble of the 8 bit function set, pulsed three times to reach a known state.
pub(crate) const LCD_RESET_NIBBLE: u8 = Instruction::FunctionSet as u8 | BitMode::Bit8 as u8;
/// Upper nibble of the 4 bit function set, switches the interface to 4 bit.
pub(crate) const LCD_INTERFACE_NIBBLE: u8 = Instruction::FunctionSet as u8 | BitMode::Bit4 as u8;

const ROW_OFFSETS_2_ROWS: [u8; 2] = [0x00, 0x40];
const ROW_OFFSETS_4_ROWS_LCD: [u8; 4] = [0x00, 0x40, 0x14, 0x54];
const ROW_OFFSETS_4_ROWS_OLED: [u8; 4] = [0x00, 0x20, 0x40, 0x60];

/// Function set bits: 5x8 font, one or two lines. The LCD always runs its 4 bit interface.
pub(crate) fn function_set_bits(rows: u8) -> u8 {
    let lines = if rows > 1 { Lines::Two } else { Lines::One };
    BitMode::Bit4 as u8 | lines as u8
}

/// DDRAM offset of the first column of a one based `row`.
fn row_offset(family: DisplayFamily, rows: u8, row: u8) -> u8 {
    let index = usize::from(row.saturating_sub(1));
    let offsets: &[u8] = match (rows, family) {
        (0..=2, _) => &ROW_OFFSETS_2_ROWS,
        (_, DisplayFamily::Lcd) => &ROW_OFFSETS_4_ROWS_LCD,
        (_, DisplayFamily::Oled) => &ROW_OFFSETS_4_ROWS_OLED,
    };
    offsets[index.min(offsets.len() - 1)]
}

/// Set DDRAM address command for the one based (`row`, `col`). Rows past the last row of the
/// display land on the last row, row and column 0 are treated as 1.
pub(crate) fn ddram_address(family: DisplayFamily, rows: u8, row: u8, col: u8) -> u8 {
    let row = row.min(rows).max(1);
    let address = col
        .saturating_sub(1)
        .wrapping_add(row_offset(family, rows, row));
    Instruction::DdramAddr as u8 | address
}

/// Set CGRAM address command for one of the 8 custom character slots.
pub(crate) fn cgram_address(slot: u8) -> u8 {
    Instruction::CgramAddr as u8 | ((slot & 0x07) << 3)
}

/// Splits `value` into the two expander bytes carrying its high and low nibble, with the
/// register select and backlight bits set.
pub(crate) fn lcd_nibbles(value: u8, register: Register, backlight: u8) -> [u8; 2] {
    [
        (value & 0xF0) | backlight | register as u8,
        ((value << 4) & 0xF0) | backlight | register as u8,
    ]
}

/// The three expander writes that latch one nibble: settle, enable high, enable low.
pub(crate) fn lcd_pulse(byte: u8) -> [u8; 3] {
    [byte, byte | LCD_ENABLE, byte & !LCD_ENABLE]
}

pub(crate) fn oled_command(value: u8) -> [u8; 2] {
    [OledControl::Command as u8, value]
}

pub(crate) fn oled_data(value: u8) -> [u8; 2] {
    [OledControl::Data as u8, value]
}

/// Enter RE (extended instruction set).
pub(crate) const OLED_RE_ON: u8 = 0x2A;
/// Leave RE and IS.
pub(crate) const OLED_RE_OFF: u8 = 0x28;
/// Enter SD (OLED characterization).
pub(crate) const OLED_SD_ON: u8 = 0x79;
/// Leave SD.
pub(crate) const OLED_SD_OFF: u8 = 0x78;

/// Commands issued for an OLED characterization `command` with its `value`: RE=1, SD=1, command,
/// value, SD=0, RE=0. Every bank switch is preceded by a set DDRAM address 0.
pub(crate) fn oled_extended(command: u8, value: u8) -> [u8; 10] {
    let home = Instruction::DdramAddr as u8;
    [
        home,
        OLED_RE_ON,
        home,
        OLED_SD_ON,
        command,
        value,
        home,
        OLED_SD_OFF,
        home,
        OLED_RE_OFF,
    ]
}

/// One step of the US2066 setup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum OledStep {
    Command(u8),
    Data(u8),
}

use OledStep::{Command, Data};

/// Setup up to the extended function set, which depends on the number of rows.
pub(crate) const OLED_SETUP_HEAD: [OledStep; 10] = [
    Command(OLED_RE_ON),
    Command(0x71), // function selection A
    Data(0x5C),    // internal regulator on, works for 3.3V and 5V
    Command(OLED_RE_OFF),
    Command(0x08), // display, cursor and blink off during setup
    Command(OLED_RE_ON),
    Command(OLED_SD_ON),
    Command(0xD5), // clock divide ratio / oscillator frequency
    Command(0x70),
    Command(OLED_SD_OFF),
];

/// Extended function set: 5x8 font, 1/2 or 3/4 line display.
pub(crate) fn oled_extended_function_set(rows: u8) -> OledStep {
    if rows > 2 {
        Command(0x09)
    } else {
        Command(0x08)
    }
}

/// Rest of the setup, followed by a 100ms wait.
pub(crate) const OLED_SETUP_TAIL: [OledStep; 18] = [
    Command(0x06), // COM0 -> COM31, SEG99 -> SEG0
    Command(0x72), // function selection B
    Data(0x08),    // ROM C, 8 CGRAM characters
    Command(OLED_SD_ON),
    Command(0xDA), // SEG pins hardware configuration
    Command(0x10),
    Command(0xDC), // function selection C: internal VSL, GPIO HiZ
    Command(0x00),
    Command(crate::OLED_SET_CONTRAST),
    Command(0xFF),
    Command(0xD9), // phase length
    Command(0xF1),
    Command(0xDB), // VCOMH deselect level
    Command(0x40),
    Command(OLED_SD_OFF),
    Command(OLED_RE_OFF),
    Command(Instruction::Clear as u8),
    Command(Instruction::DdramAddr as u8),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Backlight;

    #[test]
    fn two_row_offsets_are_shared() {
        for family in [DisplayFamily::Lcd, DisplayFamily::Oled] {
            assert_eq!(ddram_address(family, 1, 1, 1), 0x80);
            assert_eq!(ddram_address(family, 1, 1, 16), 0x8F);
            assert_eq!(ddram_address(family, 2, 1, 1), 0x80);
            assert_eq!(ddram_address(family, 2, 2, 5), 0x80 | 0x44);
        }
    }

    #[test]
    fn four_row_offsets_differ_by_family() {
        let first_columns = |family| -> [u8; 4] {
            core::array::from_fn(|r| ddram_address(family, 4, r as u8 + 1, 1))
        };
        let lcd = first_columns(DisplayFamily::Lcd);
        let oled = first_columns(DisplayFamily::Oled);
        assert_eq!(lcd, [0x80, 0xC0, 0x94, 0xD4]);
        assert_eq!(oled, [0x80, 0xA0, 0xC0, 0xE0]);
        assert_eq!(ddram_address(DisplayFamily::Lcd, 3, 3, 20), 0x80 | (0x14 + 19));
    }

    #[test]
    fn row_past_end_lands_on_last_row() {
        assert_eq!(
            ddram_address(DisplayFamily::Lcd, 2, 7, 3),
            ddram_address(DisplayFamily::Lcd, 2, 2, 3)
        );
        assert_eq!(
            ddram_address(DisplayFamily::Oled, 3, 4, 1),
            ddram_address(DisplayFamily::Oled, 3, 3, 1)
        );
        assert_eq!(
            ddram_address(DisplayFamily::Lcd, 1, 2, 1),
            ddram_address(DisplayFamily::Lcd, 1, 1, 1)
        );
    }

    #[test]
    fn row_and_col_zero_are_first() {
        assert_eq!(ddram_address(DisplayFamily::Oled, 4, 0, 0), 0x80);
    }

    #[test]
    fn cgram_slot_wraps() {
        assert_eq!(cgram_address(0), 0x40);
        assert_eq!(cgram_address(1), 0x48);
        assert_eq!(cgram_address(9), cgram_address(1));
        assert_eq!(cgram_address(7), 0x78);
    }

    #[test]
    fn nibbles_carry_backlight_and_register() {
        assert_eq!(
            lcd_nibbles(0x28, Register::Command, Backlight::On as u8),
            [0x28, 0x88]
        );
        assert_eq!(
            lcd_nibbles(b'A', Register::Data, Backlight::Off as u8),
            [0x41, 0x11]
        );
    }

    #[test]
    fn pulse_toggles_enable_only() {
        assert_eq!(lcd_pulse(0x38), [0x38, 0x3C, 0x38]);
    }

    #[test]
    fn function_set_lines() {
        assert_eq!(function_set_bits(1), 0x00);
        assert_eq!(function_set_bits(2), 0x08);
        assert_eq!(function_set_bits(4), 0x08);
    }

    #[test]
    fn extended_bracket() {
        assert_eq!(
            oled_extended(0x81, 0x80),
            [0x80, 0x2A, 0x80, 0x79, 0x81, 0x80, 0x80, 0x78, 0x80, 0x28]
        );
    }

    #[test]
    fn oled_control_bytes() {
        assert_eq!(oled_command(0x0C), [0x80, 0x0C]);
        assert_eq!(oled_data(b'x'), [0x40, b'x']);
    }
}
