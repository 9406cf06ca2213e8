//! SPI Bus Device Access
//!
//! Safe wrapper around the Linux spidev character device for the ADC read
//! path. One `transfer` call performs one blocking full-duplex exchange.
//! A scriptable [`MockBus`] is provided for tests and non-hardware builds.

mod error;
mod mock;
mod spidev;

pub use error::SpiError;
pub use mock::MockBus;
pub use spidev::SpiDevice;

/// One synchronous full-duplex exchange per call.
///
/// `tx` and `rx` must be the same length; the device shifts `tx` out while
/// filling `rx`. Implementations may block for the duration of the exchange.
pub trait BusDevice: Send {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError>;
}

/// SPI bus configuration, fixed at startup
#[derive(Debug, Clone)]
pub struct SpiConfig {
    /// Chip-select channel on bus 0 (`/dev/spidev0.<channel>`)
    pub channel: u32,
    /// Clock speed in Hz
    pub speed_hz: u32,
    /// SPI mode bits (CPOL/CPHA, 0-3)
    pub mode: u8,
    /// Word size in bits
    pub bits_per_word: u8,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            speed_hz: 1_000_000,
            mode: 0,
            bits_per_word: 8,
        }
    }
}
