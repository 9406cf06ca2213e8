//! Bridge Configuration
//!
//! All parameters come from the command line and are fixed at startup.
//! Malformed numeric values fall back silently to the field default rather
//! than failing startup.

use clap::Parser;
use std::convert::Infallible;
use tracing::warn;

/// Default ring buffer capacity in samples
pub const DEFAULT_BUFLEN: u32 = 4096;
/// Default destination address
pub const DEFAULT_SENDTO_IP: &str = "127.0.0.1";
/// Default destination port
pub const DEFAULT_SENDTO_PORT: u16 = 62988;
/// Default SPI chip-select channel
pub const DEFAULT_SPI_CH: u32 = 0;
/// Default SPI clock speed in Hz
pub const DEFAULT_SPI_FREQ: u32 = 1_000_000;
/// Default trigger period in samples
pub const DEFAULT_SEND_TIMING: u32 = 128;

fn lenient_u32<const DEFAULT: u32>(raw: &str) -> Result<u32, Infallible> {
    Ok(raw.parse().unwrap_or(DEFAULT))
}

fn lenient_u16<const DEFAULT: u16>(raw: &str) -> Result<u16, Infallible> {
    Ok(raw.parse().unwrap_or(DEFAULT))
}

/// Stream ADC samples read over SPI to a remote host over UDP
#[derive(Debug, Parser)]
#[command(name = "adc-bridge", version, about)]
pub struct BridgeConfig {
    /// Ring buffer capacity in samples
    #[arg(long = "buflen", default_value_t = DEFAULT_BUFLEN,
          value_parser = lenient_u32::<DEFAULT_BUFLEN>)]
    pub buflen: u32,

    /// Destination IP address or hostname
    #[arg(long = "sendto-ip", default_value = DEFAULT_SENDTO_IP)]
    pub sendto_ip: String,

    /// Destination UDP port
    #[arg(long = "sendto-port", default_value_t = DEFAULT_SENDTO_PORT,
          value_parser = lenient_u16::<DEFAULT_SENDTO_PORT>)]
    pub sendto_port: u16,

    /// SPI chip-select channel
    #[arg(long = "spi-ch", default_value_t = DEFAULT_SPI_CH,
          value_parser = lenient_u32::<DEFAULT_SPI_CH>)]
    pub spi_ch: u32,

    /// SPI clock frequency in Hz
    #[arg(long = "spi-freq", default_value_t = DEFAULT_SPI_FREQ,
          value_parser = lenient_u32::<DEFAULT_SPI_FREQ>)]
    pub spi_freq: u32,

    /// Samples between send triggers
    #[arg(long = "sendto-timing", default_value_t = DEFAULT_SEND_TIMING,
          value_parser = lenient_u32::<DEFAULT_SEND_TIMING>)]
    pub send_timing: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buflen: DEFAULT_BUFLEN,
            sendto_ip: DEFAULT_SENDTO_IP.to_string(),
            sendto_port: DEFAULT_SENDTO_PORT,
            spi_ch: DEFAULT_SPI_CH,
            spi_freq: DEFAULT_SPI_FREQ,
            send_timing: DEFAULT_SEND_TIMING,
        }
    }
}

impl BridgeConfig {
    /// Trigger period actually used by the loops.
    ///
    /// The window cannot be longer than what the buffer retains, so a period
    /// above the capacity is clamped down to it.
    pub fn effective_send_timing(&self) -> u32 {
        if self.send_timing > self.buflen {
            warn!(
                requested = self.send_timing,
                clamped = self.buflen,
                "send timing exceeds buffer capacity, clamping"
            );
            self.buflen
        } else {
            self.send_timing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BridgeConfig::try_parse_from(["adc-bridge"]).unwrap();
        assert_eq!(config.buflen, 4096);
        assert_eq!(config.sendto_ip, "127.0.0.1");
        assert_eq!(config.sendto_port, 62988);
        assert_eq!(config.spi_ch, 0);
        assert_eq!(config.spi_freq, 1_000_000);
        assert_eq!(config.send_timing, 128);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = BridgeConfig::try_parse_from([
            "adc-bridge",
            "--buflen",
            "abc",
            "--sendto-port",
            "not-a-port",
            "--spi-freq",
            "99999999999999999999",
            "--sendto-timing",
            "12x",
        ])
        .unwrap();
        assert_eq!(config.buflen, DEFAULT_BUFLEN);
        assert_eq!(config.sendto_port, DEFAULT_SENDTO_PORT);
        assert_eq!(config.spi_freq, DEFAULT_SPI_FREQ);
        assert_eq!(config.send_timing, DEFAULT_SEND_TIMING);
    }

    #[test]
    fn well_formed_arguments_are_used() {
        let config = BridgeConfig::try_parse_from([
            "adc-bridge",
            "--buflen",
            "8",
            "--sendto-ip",
            "192.168.1.20",
            "--sendto-port",
            "9000",
            "--spi-ch",
            "1",
            "--sendto-timing",
            "4",
        ])
        .unwrap();
        assert_eq!(config.buflen, 8);
        assert_eq!(config.sendto_ip, "192.168.1.20");
        assert_eq!(config.sendto_port, 9000);
        assert_eq!(config.spi_ch, 1);
        assert_eq!(config.effective_send_timing(), 4);
    }

    #[test]
    fn send_timing_clamps_to_capacity() {
        let config = BridgeConfig {
            buflen: 8,
            send_timing: 32,
            ..Default::default()
        };
        assert_eq!(config.effective_send_timing(), 8);
    }
}
