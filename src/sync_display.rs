use embedded_hal::delay::DelayNs;

use ufmt_write::uWrite;

use crate::bus::Bus;
use crate::config::{BusChannel, DisplayConfig};
use crate::protocol::{self, OledStep};
use crate::{
    Backlight, DisplayControl, DisplayFamily, EntryMode, Fade, Instruction, Register,
    ShiftDirection, ShiftTarget, OLED_SET_CONTRAST, OLED_SET_FADE,
};

/// API to write to a LCD or OLED character display.
pub struct CharDisplay<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    bus: &'a mut B,
    delay: &'a mut D,
    config: DisplayConfig,
    entry_mode: u8,
    display_control: u8,
    function_set: u8,
    backlight_state: Backlight,
}

impl<'a, B, D> CharDisplay<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    /// Create a new instance for the display at `address` with one based number of `rows`.
    /// Nothing is sent before [`begin`](Self::begin).
    pub fn new(
        bus: &'a mut B,
        delay: &'a mut D,
        family: DisplayFamily,
        address: u8,
        rows: u8,
    ) -> Self {
        let config = DisplayConfig::new(family, address, rows);
        Self {
            bus,
            delay,
            config,
            entry_mode: protocol::DEFAULT_ENTRY_MODE,
            display_control: protocol::DEFAULT_DISPLAY_CONTROL,
            function_set: protocol::function_set_bits(config.rows()),
            backlight_state: Backlight::On,
        }
    }

    /// Use the secondary i2c interface of a [`DualBus`](crate::DualBus).
    pub fn with_channel(mut self, channel: BusChannel) -> Self {
        self.config = self.config.with_channel(channel);
        self
    }

    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    /// Last display control bits sent, see [`DisplayControl`].
    pub fn display_control(&self) -> u8 {
        self.display_control
    }

    /// Last entry mode bits sent, see [`EntryMode`].
    pub fn entry_mode(&self) -> u8 {
        self.entry_mode
    }

    pub fn function_set(&self) -> u8 {
        self.function_set
    }

    pub fn backlight_state(&self) -> Backlight {
        self.backlight_state
    }

    /// Initializes the hardware, run this first.
    ///
    /// Both families end up in the same state: display on, cursor and blink off, text left to
    /// right without shifting, cleared, cursor at (1, 1).
    pub fn begin(&mut self) -> Result<(), B::Error> {
        log::debug!(
            "begin {:?} display at {:#04x} on {:?}, {} rows",
            self.config.family(),
            self.config.address(),
            self.config.channel(),
            self.config.rows()
        );
        self.bus.open(self.config.channel())?;
        match self.config.family() {
            DisplayFamily::Lcd => self.lcd_begin(),
            DisplayFamily::Oled => self.oled_begin(),
        }
    }

    /// HD44780 reset: the controller may be in 8 bit mode or halfway through a 4 bit transfer,
    /// three 8 bit function sets bring it into a known state before switching to 4 bit.
    fn lcd_begin(&mut self) -> Result<(), B::Error> {
        self.delay.delay_ms(protocol::POWER_UP_MS);

        // All expander outputs low except the backlight.
        self.write_bus(&[self.backlight_state as u8])?;
        self.delay.delay_ms(protocol::LCD_EXPANDER_SETTLE_MS);

        let backlight = self.backlight_state as u8;
        for _ in 0..3 {
            self.pulse(protocol::LCD_RESET_NIBBLE | backlight)?;
            self.delay.delay_us(protocol::LCD_RESET_WAIT_US);
        }
        self.pulse(protocol::LCD_INTERFACE_NIBBLE | backlight)?;

        self.set_defaults()
    }

    fn oled_begin(&mut self) -> Result<(), B::Error> {
        self.delay.delay_ms(protocol::POWER_UP_MS);

        let function_set = protocol::oled_extended_function_set(self.config.rows());
        let setup = protocol::OLED_SETUP_HEAD
            .iter()
            .chain(core::iter::once(&function_set))
            .chain(protocol::OLED_SETUP_TAIL.iter());
        for step in setup {
            match *step {
                OledStep::Command(value) => self.send_command(value)?,
                OledStep::Data(value) => self.send_data(value)?,
            }
        }
        self.delay.delay_ms(protocol::POWER_UP_MS);

        self.set_defaults()
    }

    fn set_defaults(&mut self) -> Result<(), B::Error> {
        self.function_set = protocol::function_set_bits(self.config.rows());
        self.send_command(Instruction::FunctionSet as u8 | self.function_set)?;

        self.display_control = protocol::DEFAULT_DISPLAY_CONTROL;
        self.send_command(Instruction::DisplayControl as u8 | self.display_control)?;

        self.entry_mode = protocol::DEFAULT_ENTRY_MODE;
        self.send_command(Instruction::EntryModeSet as u8 | self.entry_mode)?;

        self.clear()?;
        self.home()
    }

    fn write_bus(&mut self, bytes: &[u8]) -> Result<(), B::Error> {
        self.bus
            .write(self.config.channel(), self.config.address(), bytes)
    }

    /// Latches one nibble into the HD44780 on the falling edge of enable.
    fn pulse(&mut self, byte: u8) -> Result<(), B::Error> {
        let [settle, enable_high, enable_low] = protocol::lcd_pulse(byte);
        self.write_bus(&[settle])?;
        self.write_bus(&[enable_high])?;
        self.delay.delay_us(protocol::ENABLE_PULSE_US);
        self.write_bus(&[enable_low])?;
        self.delay.delay_us(protocol::ENABLE_PULSE_US);
        Ok(())
    }

    fn send_lcd(&mut self, value: u8, register: Register) -> Result<(), B::Error> {
        for byte in protocol::lcd_nibbles(value, register, self.backlight_state as u8) {
            self.pulse(byte)?;
        }
        Ok(())
    }

    fn send_command(&mut self, value: u8) -> Result<(), B::Error> {
        log::trace!("command {:#04x}", value);
        match self.config.family() {
            DisplayFamily::Lcd => self.send_lcd(value, Register::Command),
            DisplayFamily::Oled => {
                self.write_bus(&protocol::oled_command(value))?;
                self.delay.delay_ms(protocol::OLED_COMMAND_SETTLE_MS);
                Ok(())
            }
        }
    }

    fn send_data(&mut self, value: u8) -> Result<(), B::Error> {
        match self.config.family() {
            DisplayFamily::Lcd => self.send_lcd(value, Register::Data),
            DisplayFamily::Oled => self.write_bus(&protocol::oled_data(value)),
        }
    }

    /// Write one character, returns the number of bytes consumed which is always 1.
    pub fn write(&mut self, byte: u8) -> Result<usize, B::Error> {
        self.send_data(byte)?;
        Ok(1)
    }

    /// Write string to display.
    pub fn write_str(&mut self, data: &str) -> Result<(), B::Error> {
        for byte in data.bytes() {
            self.write(byte)?;
        }
        Ok(())
    }

    /// Move the cursor to (`row`, `col`) and print `value` there.
    pub fn print_at<T>(&mut self, row: u8, col: u8, value: &T) -> Result<(), B::Error>
    where
        T: ufmt::uDisplay + ?Sized,
    {
        self.cursor_move(row, col)?;
        value.fmt(&mut ufmt::Formatter::new(self))
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), B::Error> {
        self.send_command(Instruction::Clear as u8)?;
        self.delay.delay_us(protocol::CLEAR_SETTLE_US);
        Ok(())
    }

    /// Move the cursor to (1, 1). Uses a DDRAM address instead of return home, which flickers
    /// on OLEDs.
    pub fn home(&mut self) -> Result<(), B::Error> {
        self.cursor_move(1, 1)
    }

    /// Set the cursor to (`row`, `col`), both one based. Rows past the last row land on the
    /// last row.
    pub fn cursor_move(&mut self, row: u8, col: u8) -> Result<(), B::Error> {
        let command =
            protocol::ddram_address(self.config.family(), self.config.rows(), row, col);
        self.send_command(command)
    }

    fn update_display_control(&mut self, bit: DisplayControl, on: bool) -> Result<(), B::Error> {
        if on {
            self.display_control |= bit as u8;
        } else {
            self.display_control &= !(bit as u8);
        }
        self.send_command(Instruction::DisplayControl as u8 | self.display_control)
    }

    fn update_entry_mode(&mut self, bit: EntryMode, on: bool) -> Result<(), B::Error> {
        if on {
            self.entry_mode |= bit as u8;
        } else {
            self.entry_mode &= !(bit as u8);
        }
        self.send_command(Instruction::EntryModeSet as u8 | self.entry_mode)
    }

    pub fn display_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::DisplayOn, true)
    }

    pub fn display_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::DisplayOn, false)
    }

    /// Underline cursor.
    pub fn cursor_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorOn, true)
    }

    pub fn cursor_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorOn, false)
    }

    /// Blinking block cursor.
    pub fn cursor_blink_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorBlink, true)
    }

    pub fn cursor_blink_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorBlink, false)
    }

    pub fn display_left_to_right(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::LeftToRight, true)
    }

    pub fn display_right_to_left(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::LeftToRight, false)
    }

    /// Keep the cursor in place and shift the text when a character is written.
    pub fn display_shift_on(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::ShiftOnWrite, true)
    }

    pub fn display_shift_off(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::ShiftOnWrite, false)
    }

    fn shift(&mut self, target: ShiftTarget, direction: ShiftDirection) -> Result<(), B::Error> {
        self.send_command(Instruction::Shift as u8 | target as u8 | direction as u8)
    }

    /// Scrolls all rows one char to the left, the cursor follows.
    pub fn display_shift_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDirection::Left)
    }

    /// Scrolls all rows one char to the right, the cursor follows.
    pub fn display_shift_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDirection::Right)
    }

    pub fn cursor_shift_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Left)
    }

    pub fn cursor_shift_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Right)
    }

    /// Store a 5x8 custom character in one of the 8 CGRAM slots, `slot` wraps at 8. Print it
    /// with `write(slot)`. The address counter is left in CGRAM, call
    /// [`cursor_move`](Self::cursor_move) before writing text again.
    pub fn create_character(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<(), B::Error> {
        self.send_command(protocol::cgram_address(slot))?;
        for &row in bitmap {
            self.write(row)?;
        }
        Ok(())
    }

    /// Switch the LCD backlight. The new state is latched right away and kept in every
    /// following byte. Ignored on OLEDs.
    pub fn backlight(&mut self, backlight: Backlight) -> Result<(), B::Error> {
        if self.config.family() != DisplayFamily::Lcd {
            log::debug!("backlight ignored on {:?}", self.config.family());
            return Ok(());
        }
        self.backlight_state = backlight;
        self.write_bus(&[backlight as u8])
    }

    pub fn backlight_on(&mut self) -> Result<(), B::Error> {
        self.backlight(Backlight::On)
    }

    pub fn backlight_off(&mut self) -> Result<(), B::Error> {
        self.backlight(Backlight::Off)
    }

    /// Issue a characterization command of the US2066 inside the RE/SD bank bracket.
    fn oled_extended(&mut self, command: u8, value: u8) -> Result<(), B::Error> {
        if self.config.family() != DisplayFamily::Oled {
            log::debug!("command {:#04x} ignored on {:?}", command, self.config.family());
            return Ok(());
        }
        for byte in protocol::oled_extended(command, value) {
            self.send_command(byte)?;
        }
        Ok(())
    }

    /// OLED contrast, 0 to 255. Ignored on LCDs.
    pub fn set_brightness(&mut self, value: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_CONTRAST, value)
    }

    pub fn fade_off(&mut self) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Off as u8)
    }

    /// Fade the OLED out once, `rate` 0 to 15.
    pub fn fade_once(&mut self, rate: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Once as u8 | (rate & 0x0F))
    }

    /// Fade the OLED out and in repeatedly, `rate` 0 to 15.
    pub fn fade_blink(&mut self, rate: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Blink as u8 | (rate & 0x0F))
    }
}

impl<'a, B, D> uWrite for CharDisplay<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    type Error = B::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}

impl<'a, B, D> core::fmt::Write for CharDisplay<'a, B, D>
where
    B: Bus,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        CharDisplay::write_str(self, s).map_err(|_| core::fmt::Error)
    }
}
