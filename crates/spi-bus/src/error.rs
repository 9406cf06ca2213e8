//! SPI Error Types

use thiserror::Error;

/// Errors from SPI device setup and transfers
#[derive(Debug, Error)]
pub enum SpiError {
    /// Failed to open the spidev node
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        source: std::io::Error,
    },

    /// Failed to apply mode/speed/word-size settings
    #[error("failed to configure {setting}: {source}")]
    Configure {
        setting: &'static str,
        source: std::io::Error,
    },

    /// A full-duplex exchange failed
    #[error("SPI transfer failed: {0}")]
    Transfer(std::io::Error),

    /// tx and rx buffers must be the same length
    #[error("buffer length mismatch: tx {tx_len}, rx {rx_len}")]
    LengthMismatch { tx_len: usize, rx_len: usize },

    /// spidev is only available on Linux
    #[error("SPI bus access is not supported on this platform")]
    Unsupported,
}
