//! Display configuration, fixed when the driver is created.

use crate::DisplayFamily;

/// Usual address of a PCF8574 LCD backpack.
pub const LCD_DEFAULT_ADDRESS: u8 = 0x27;
/// US2066 address with SA0 pulled low.
pub const OLED_PRIMARY_ADDRESS: u8 = 0x3C;
/// US2066 address with SA0 pulled high.
pub const OLED_SECONDARY_ADDRESS: u8 = 0x3D;

/// Largest number of rows either controller can address.
pub const MAX_ROWS: u8 = 4;

/// Which of (at most) two physical i2c interfaces a display hangs on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BusChannel {
    #[default]
    Primary,
    Secondary,
}

/// Immutable description of a display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    family: DisplayFamily,
    address: u8,
    rows: u8,
    channel: BusChannel,
}

impl DisplayConfig {
    /// One based number of rows, clamped to `1..=4`. The address is masked to 7 bits.
    pub fn new(family: DisplayFamily, address: u8, rows: u8) -> Self {
        Self {
            family,
            address: address & 0x7F,
            rows: rows.clamp(1, MAX_ROWS),
            channel: BusChannel::Primary,
        }
    }

    pub fn with_channel(mut self, channel: BusChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn family(&self) -> DisplayFamily {
        self.family
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn channel(&self) -> BusChannel {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_clamped() {
        assert_eq!(DisplayConfig::new(DisplayFamily::Lcd, 0x27, 0).rows(), 1);
        assert_eq!(DisplayConfig::new(DisplayFamily::Lcd, 0x27, 2).rows(), 2);
        assert_eq!(DisplayConfig::new(DisplayFamily::Oled, 0x3C, 9).rows(), 4);
    }

    #[test]
    fn address_is_seven_bits() {
        let config = DisplayConfig::new(DisplayFamily::Oled, 0xBC, 2);
        assert_eq!(config.address(), OLED_PRIMARY_ADDRESS);
    }

    #[test]
    fn channel_defaults_to_primary() {
        let config = DisplayConfig::new(DisplayFamily::Lcd, LCD_DEFAULT_ADDRESS, 2);
        assert_eq!(config.channel(), BusChannel::Primary);
        let config = config.with_channel(BusChannel::Secondary);
        assert_eq!(config.channel(), BusChannel::Secondary);
        assert_eq!(config.family(), DisplayFamily::Lcd);
    }
}
