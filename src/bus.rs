//! Bus transport used by the display drivers.
//!
//! The drivers only need two things from the bus: an idempotent `open` for the interface a
//! display hangs on, and addressed multi-byte writes. Every [`embedded_hal::i2c::I2c`]
//! implementation is a [`Bus`] with a single interface, the channel is ignored. Boards with a
//! second i2c interface wrap both peripherals in a [`DualBus`].

use core::fmt::Debug;

use embedded_hal::i2c::{ErrorType, I2c};

pub use crate::config::BusChannel;

/// Write-only transport to a display.
pub trait Bus {
    type Error: Debug;

    /// Prepares the interface for `channel`. Calling it more than once is harmless.
    fn open(&mut self, _channel: BusChannel) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Writes `bytes` to the 7 bit `address` in one transaction.
    fn write(&mut self, channel: BusChannel, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<I: I2c> Bus for I {
    type Error = <I as ErrorType>::Error;

    fn write(&mut self, _channel: BusChannel, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        I2c::write(self, address, bytes)
    }
}

/// Async variant of [`Bus`], implemented for every [`embedded_hal_async::i2c::I2c`].
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncBus {
    type Error: Debug;

    async fn open(&mut self, _channel: BusChannel) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn write(
        &mut self,
        channel: BusChannel,
        address: u8,
        bytes: &[u8],
    ) -> Result<(), Self::Error>;
}

#[cfg(feature = "async")]
impl<I: embedded_hal_async::i2c::I2c> AsyncBus for I {
    type Error = <I as ErrorType>::Error;

    async fn write(
        &mut self,
        _channel: BusChannel,
        address: u8,
        bytes: &[u8],
    ) -> Result<(), Self::Error> {
        embedded_hal_async::i2c::I2c::write(self, address, bytes).await
    }
}

/// Two physical i2c interfaces, selected per display by [`BusChannel`].
#[derive(Debug)]
pub struct DualBus<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> DualBus<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    /// Gives both interfaces back.
    pub fn release(self) -> (P, S) {
        (self.primary, self.secondary)
    }
}

impl<P: I2c, S: I2c> Bus for DualBus<P, S> {
    type Error = DualBusError<P::Error, S::Error>;

    fn write(&mut self, channel: BusChannel, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        match channel {
            BusChannel::Primary => {
                I2c::write(&mut self.primary, address, bytes).map_err(DualBusError::Primary)
            }
            BusChannel::Secondary => {
                I2c::write(&mut self.secondary, address, bytes).map_err(DualBusError::Secondary)
            }
        }
    }
}

#[cfg(feature = "async")]
impl<P, S> AsyncBus for DualBus<P, S>
where
    P: embedded_hal_async::i2c::I2c,
    S: embedded_hal_async::i2c::I2c,
{
    type Error = DualBusError<P::Error, S::Error>;

    async fn write(
        &mut self,
        channel: BusChannel,
        address: u8,
        bytes: &[u8],
    ) -> Result<(), Self::Error> {
        match channel {
            BusChannel::Primary => embedded_hal_async::i2c::I2c::write(
                &mut self.primary,
                address,
                bytes,
            )
            .await
            .map_err(DualBusError::Primary),
            BusChannel::Secondary => embedded_hal_async::i2c::I2c::write(
                &mut self.secondary,
                address,
                bytes,
            )
            .await
            .map_err(DualBusError::Secondary),
        }
    }
}

/// Error of one of the two interfaces of a [`DualBus`].
#[derive(Debug, PartialEq, Eq)]
pub enum DualBusError<P, S> {
    Primary(P),
    Secondary(S),
}

impl<P: Debug, S: Debug> core::fmt::Display for DualBusError<P, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Primary(e) => write!(f, "primary i2c error: {e:?}"),
            Self::Secondary(e) => write!(f, "secondary i2c error: {e:?}"),
        }
    }
}

impl<P: Debug, S: Debug> core::error::Error for DualBusError<P, S> {}
