use embedded_hal_async::delay::DelayNs;

use crate::bus::AsyncBus;
use crate::config::{BusChannel, DisplayConfig};
use crate::protocol::{self, OledStep};
use crate::{
    Backlight, DisplayControl, DisplayFamily, EntryMode, Fade, Instruction, Register,
    ShiftDirection, ShiftTarget, OLED_SET_CONTRAST, OLED_SET_FADE,
};

/// API to write to a LCD or OLED character display.
pub struct CharDisplay<'a, B, D>
where
    B: AsyncBus,
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
    B: AsyncBus,
    D: DelayNs,
{
    /// Create a new instance for the display at `address` with one based number of `rows`.
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

    pub fn with_channel(mut self, channel: BusChannel) -> Self {
        self.config = self.config.with_channel(channel);
        self
    }

    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    pub fn display_control(&self) -> u8 {
        self.display_control
    }

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
    pub async fn begin(&mut self) -> Result<(), B::Error> {
        log::debug!(
            "begin {:?} display at {:#04x} on {:?}, {} rows",
            self.config.family(),
            self.config.address(),
            self.config.channel(),
            self.config.rows()
        );
        self.bus.open(self.config.channel()).await?;
        match self.config.family() {
            DisplayFamily::Lcd => self.lcd_begin().await,
            DisplayFamily::Oled => self.oled_begin().await,
        }
    }

    async fn lcd_begin(&mut self) -> Result<(), B::Error> {
        self.delay.delay_ms(protocol::POWER_UP_MS).await;

        self.write_bus(&[self.backlight_state as u8]).await?;
        self.delay.delay_ms(protocol::LCD_EXPANDER_SETTLE_MS).await;

        let backlight = self.backlight_state as u8;
        for _ in 0..3 {
            self.pulse(protocol::LCD_RESET_NIBBLE | backlight).await?;
            self.delay.delay_us(protocol::LCD_RESET_WAIT_US).await;
        }
        self.pulse(protocol::LCD_INTERFACE_NIBBLE | backlight).await?;

        self.set_defaults().await
    }

    async fn oled_begin(&mut self) -> Result<(), B::Error> {
        self.delay.delay_ms(protocol::POWER_UP_MS).await;

        let function_set = protocol::oled_extended_function_set(self.config.rows());
        let setup = protocol::OLED_SETUP_HEAD
            .iter()
            .chain(core::iter::once(&function_set))
            .chain(protocol::OLED_SETUP_TAIL.iter());
        for step in setup {
            match *step {
                OledStep::Command(value) => self.send_command(value).await?,
                OledStep::Data(value) => self.send_data(value).await?,
            }
        }
        self.delay.delay_ms(protocol::POWER_UP_MS).await;

        self.set_defaults().await
    }

    async fn set_defaults(&mut self) -> Result<(), B::Error> {
        self.function_set = protocol::function_set_bits(self.config.rows());
        self.send_command(Instruction::FunctionSet as u8 | self.function_set)
            .await?;

        self.display_control = protocol::DEFAULT_DISPLAY_CONTROL;
        self.send_command(Instruction::DisplayControl as u8 | self.display_control)
            .await?;

        self.entry_mode = protocol::DEFAULT_ENTRY_MODE;
        self.send_command(Instruction::EntryModeSet as u8 | self.entry_mode)
            .await?;

        self.clear().await?;
        self.home().await
    }

    async fn write_bus(&mut self, bytes: &[u8]) -> Result<(), B::Error> {
        self.bus
            .write(self.config.channel(), self.config.address(), bytes)
            .await
    }

    async fn pulse(&mut self, byte: u8) -> Result<(), B::Error> {
        let [settle, enable_high, enable_low] = protocol::lcd_pulse(byte);
        self.write_bus(&[settle]).await?;
        self.write_bus(&[enable_high]).await?;
        self.delay.delay_us(protocol::ENABLE_PULSE_US).await;
        self.write_bus(&[enable_low]).await?;
        self.delay.delay_us(protocol::ENABLE_PULSE_US).await;
        Ok(())
    }

    async fn send_lcd(&mut self, value: u8, register: Register) -> Result<(), B::Error> {
        for byte in protocol::lcd_nibbles(value, register, self.backlight_state as u8) {
            self.pulse(byte).await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, value: u8) -> Result<(), B::Error> {
        log::trace!("command {:#04x}", value);
        match self.config.family() {
            DisplayFamily::Lcd => self.send_lcd(value, Register::Command).await,
            DisplayFamily::Oled => {
                self.write_bus(&protocol::oled_command(value)).await?;
                self.delay
                    .delay_ms(protocol::OLED_COMMAND_SETTLE_MS)
                    .await;
                Ok(())
            }
        }
    }

    async fn send_data(&mut self, value: u8) -> Result<(), B::Error> {
        match self.config.family() {
            DisplayFamily::Lcd => self.send_lcd(value, Register::Data).await,
            DisplayFamily::Oled => self.write_bus(&protocol::oled_data(value)).await,
        }
    }

    /// Write one character, returns the number of bytes consumed which is always 1.
    pub async fn write(&mut self, byte: u8) -> Result<usize, B::Error> {
        self.send_data(byte).await?;
        Ok(1)
    }

    /// Write string to display.
    pub async fn write_str(&mut self, data: &str) -> Result<(), B::Error> {
        for byte in data.bytes() {
            self.write(byte).await?;
        }
        Ok(())
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), B::Error> {
        self.send_command(Instruction::Clear as u8).await?;
        self.delay.delay_us(protocol::CLEAR_SETTLE_US).await;
        Ok(())
    }

    /// Move the cursor to (1, 1).
    pub async fn home(&mut self) -> Result<(), B::Error> {
        self.cursor_move(1, 1).await
    }

    /// Set the cursor to (`row`, `col`), both one based.
    pub async fn cursor_move(&mut self, row: u8, col: u8) -> Result<(), B::Error> {
        let command =
            protocol::ddram_address(self.config.family(), self.config.rows(), row, col);
        self.send_command(command).await
    }

    async fn update_display_control(
        &mut self,
        bit: DisplayControl,
        on: bool,
    ) -> Result<(), B::Error> {
        if on {
            self.display_control |= bit as u8;
        } else {
            self.display_control &= !(bit as u8);
        }
        self.send_command(Instruction::DisplayControl as u8 | self.display_control)
            .await
    }

    async fn update_entry_mode(&mut self, bit: EntryMode, on: bool) -> Result<(), B::Error> {
        if on {
            self.entry_mode |= bit as u8;
        } else {
            self.entry_mode &= !(bit as u8);
        }
        self.send_command(Instruction::EntryModeSet as u8 | self.entry_mode)
            .await
    }

    pub async fn display_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::DisplayOn, true)
            .await
    }

    pub async fn display_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::DisplayOn, false)
            .await
    }

    pub async fn cursor_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorOn, true)
            .await
    }

    pub async fn cursor_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorOn, false)
            .await
    }

    pub async fn cursor_blink_on(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorBlink, true)
            .await
    }

    pub async fn cursor_blink_off(&mut self) -> Result<(), B::Error> {
        self.update_display_control(DisplayControl::CursorBlink, false)
            .await
    }

    pub async fn display_left_to_right(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::LeftToRight, true).await
    }

    pub async fn display_right_to_left(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::LeftToRight, false).await
    }

    pub async fn display_shift_on(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::ShiftOnWrite, true).await
    }

    pub async fn display_shift_off(&mut self) -> Result<(), B::Error> {
        self.update_entry_mode(EntryMode::ShiftOnWrite, false).await
    }

    async fn shift(
        &mut self,
        target: ShiftTarget,
        direction: ShiftDirection,
    ) -> Result<(), B::Error> {
        self.send_command(Instruction::Shift as u8 | target as u8 | direction as u8)
            .await
    }

    /// Scrolls the display one char to the left
    pub async fn display_shift_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDirection::Left).await
    }

    /// Scrolls the display one char to the right
    pub async fn display_shift_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Display, ShiftDirection::Right).await
    }

    /// Moves the cursor one char to the left
    pub async fn cursor_shift_left(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Left).await
    }

    /// Moves the cursor one char to the right
    pub async fn cursor_shift_right(&mut self) -> Result<(), B::Error> {
        self.shift(ShiftTarget::Cursor, ShiftDirection::Right).await
    }

    /// Store a custom character in CGRAM `slot` (wraps at 8).
    pub async fn create_character(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<(), B::Error> {
        self.send_command(protocol::cgram_address(slot)).await?;
        for &row in bitmap {
            self.write(row).await?;
        }
        Ok(())
    }

    /// Switch the LCD backlight, ignored on OLEDs.
    pub async fn backlight(&mut self, backlight: Backlight) -> Result<(), B::Error> {
        if self.config.family() != DisplayFamily::Lcd {
            log::debug!("backlight ignored on {:?}", self.config.family());
            return Ok(());
        }
        self.backlight_state = backlight;
        self.write_bus(&[backlight as u8]).await
    }

    pub async fn backlight_on(&mut self) -> Result<(), B::Error> {
        self.backlight(Backlight::On).await
    }

    pub async fn backlight_off(&mut self) -> Result<(), B::Error> {
        self.backlight(Backlight::Off).await
    }

    async fn oled_extended(&mut self, command: u8, value: u8) -> Result<(), B::Error> {
        if self.config.family() != DisplayFamily::Oled {
            log::debug!("command {:#04x} ignored on {:?}", command, self.config.family());
            return Ok(());
        }
        for byte in protocol::oled_extended(command, value) {
            self.send_command(byte).await?;
        }
        Ok(())
    }

    /// OLED contrast, ignored on LCDs.
    pub async fn set_brightness(&mut self, value: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_CONTRAST, value).await
    }

    pub async fn fade_off(&mut self) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Off as u8).await
    }

    pub async fn fade_once(&mut self, rate: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Once as u8 | (rate & 0x0F))
            .await
    }

    pub async fn fade_blink(&mut self, rate: u8) -> Result<(), B::Error> {
        self.oled_extended(OLED_SET_FADE, Fade::Blink as u8 | (rate & 0x0F))
            .await
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use std::vec::Vec;

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn lcd_pulse(address: u8, byte: u8) -> [I2cTransaction; 3] {
        [
            I2cTransaction::write(address, std::vec![byte]),
            I2cTransaction::write(address, std::vec![byte | 0x04]),
            I2cTransaction::write(address, std::vec![byte]),
        ]
    }

    #[test]
    fn lcd_begin_one_row() {
        let address = 0x27;
        let mut expected = std::vec![I2cTransaction::write(address, std::vec![0x08])];
        for _ in 0..3 {
            expected.extend(lcd_pulse(address, 0x38));
        }
        expected.extend(lcd_pulse(address, 0x28));
        // function set 0x20, display control 0x0C, entry mode 0x06, clear 0x01, home 0x80
        for (high, low) in [(0x28, 0x08), (0x08, 0xC8), (0x08, 0x68), (0x08, 0x18), (0x88, 0x08)] {
            expected.extend(lcd_pulse(address, high));
            expected.extend(lcd_pulse(address, low));
        }

        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoDelay;
        let mut lcd = CharDisplay::new(&mut i2c, &mut delay, DisplayFamily::Lcd, address, 1);
        block_on(lcd.begin()).unwrap();
        assert_eq!(lcd.function_set(), 0x00);
        drop(lcd);
        i2c.done();
    }

    #[test]
    fn oled_fade_blink_masks_rate() {
        let address = 0x3D;
        let expected: Vec<I2cTransaction> =
            [0x80, 0x2A, 0x80, 0x79, 0x23, 0x35, 0x80, 0x78, 0x80, 0x28]
                .iter()
                .map(|&value| I2cTransaction::write(address, std::vec![0x80, value]))
                .collect();
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoDelay;
        let mut oled = CharDisplay::new(&mut i2c, &mut delay, DisplayFamily::Oled, address, 4);
        block_on(oled.fade_blink(0x15)).unwrap();
        drop(oled);
        i2c.done();
    }

    #[test]
    fn oled_text_and_toggles() {
        let address = 0x3C;
        let expected = [
            I2cTransaction::write(address, std::vec![0x80, 0xE4]),
            I2cTransaction::write(address, std::vec![0x40, b'O']),
            I2cTransaction::write(address, std::vec![0x40, b'K']),
            I2cTransaction::write(address, std::vec![0x80, 0x0D]),
            I2cTransaction::write(address, std::vec![0x80, 0x07]),
        ];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoDelay;
        let mut oled = CharDisplay::new(&mut i2c, &mut delay, DisplayFamily::Oled, address, 4);
        block_on(async {
            oled.cursor_move(4, 5).await.unwrap();
            oled.write_str("OK").await.unwrap();
            oled.cursor_blink_on().await.unwrap();
            oled.display_shift_on().await.unwrap();
        });
        assert_eq!(oled.display_control(), 0x05);
        assert_eq!(oled.entry_mode(), 0x03);
        drop(oled);
        i2c.done();
    }
}
