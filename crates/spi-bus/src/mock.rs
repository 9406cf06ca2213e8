//! Scriptable Bus Device for Tests

use crate::{BusDevice, SpiError};
use std::time::Duration;

enum Replay {
    /// Serve the script once, then fail every further transfer
    Scripted,
    /// Serve the script forever, wrapping around
    Cycling,
}

/// In-process bus device returning a scripted sequence of 16-bit samples.
///
/// Each transfer answers with the next sample in device byte order. A
/// scripted bus fails once the script is exhausted, which lets a pipeline
/// under test wind itself down through the fatal-bus-error path; a cycling
/// bus serves the script forever.
pub struct MockBus {
    samples: Vec<u16>,
    replay: Replay,
    pos: usize,
    transfers: usize,
    fail_on: Option<usize>,
    transfer_delay: Option<Duration>,
}

impl MockBus {
    /// Bus serving `samples` once; transfers past the end fail.
    pub fn scripted(samples: Vec<u16>) -> Self {
        Self::new(samples, Replay::Scripted)
    }

    /// Bus serving `samples` in an endless cycle.
    pub fn cycling(samples: Vec<u16>) -> Self {
        Self::new(samples, Replay::Cycling)
    }

    fn new(samples: Vec<u16>, replay: Replay) -> Self {
        Self {
            samples,
            replay,
            pos: 0,
            transfers: 0,
            fail_on: None,
            transfer_delay: None,
        }
    }

    /// Make the transfer with index `index` (0-based) fail.
    pub fn failing_on(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }

    /// Sleep this long inside every transfer, simulating bus latency.
    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = Some(delay);
        self
    }

    /// Number of transfer calls observed so far.
    pub fn transfers(&self) -> usize {
        self.transfers
    }
}

impl BusDevice for MockBus {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
        if tx.len() != rx.len() {
            return Err(SpiError::LengthMismatch {
                tx_len: tx.len(),
                rx_len: rx.len(),
            });
        }
        if let Some(delay) = self.transfer_delay {
            std::thread::sleep(delay);
        }

        let index = self.transfers;
        self.transfers += 1;

        if self.fail_on == Some(index) {
            return Err(SpiError::Transfer(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }

        let sample = match self.replay {
            Replay::Scripted => {
                if self.pos >= self.samples.len() {
                    return Err(SpiError::Transfer(std::io::Error::from(
                        std::io::ErrorKind::UnexpectedEof,
                    )));
                }
                let s = self.samples[self.pos];
                self.pos += 1;
                s
            }
            Replay::Cycling => {
                if self.samples.is_empty() {
                    return Err(SpiError::Transfer(std::io::Error::from(
                        std::io::ErrorKind::UnexpectedEof,
                    )));
                }
                let s = self.samples[self.pos];
                self.pos = (self.pos + 1) % self.samples.len();
                s
            }
        };

        // Samples travel in device byte order end to end; the reply carries
        // the raw bytes the acquisition loop will store and forward.
        rx.copy_from_slice(&sample.to_ne_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_bus_serves_then_fails() {
        let mut bus = MockBus::scripted(vec![0x1234, 0x5678]);
        let tx = [0u8; 2];
        let mut rx = [0u8; 2];

        bus.transfer(&tx, &mut rx).unwrap();
        assert_eq!(u16::from_ne_bytes(rx), 0x1234);
        bus.transfer(&tx, &mut rx).unwrap();
        assert_eq!(u16::from_ne_bytes(rx), 0x5678);
        assert!(bus.transfer(&tx, &mut rx).is_err());
        assert_eq!(bus.transfers(), 3);
    }

    #[test]
    fn cycling_bus_wraps() {
        let mut bus = MockBus::cycling(vec![7, 8]);
        let tx = [0u8; 2];
        let mut rx = [0u8; 2];
        for expected in [7u16, 8, 7, 8, 7] {
            bus.transfer(&tx, &mut rx).unwrap();
            assert_eq!(u16::from_ne_bytes(rx), expected);
        }
    }

    #[test]
    fn scripted_failure_is_transient() {
        let mut bus = MockBus::scripted(vec![1, 2]).failing_on(1);
        let tx = [0u8; 2];
        let mut rx = [0u8; 2];

        bus.transfer(&tx, &mut rx).unwrap();
        assert!(bus.transfer(&tx, &mut rx).is_err());
        bus.transfer(&tx, &mut rx).unwrap();
        assert_eq!(u16::from_ne_bytes(rx), 2);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut bus = MockBus::cycling(vec![1]);
        let tx = [0u8; 2];
        let mut rx = [0u8; 4];
        assert!(matches!(
            bus.transfer(&tx, &mut rx),
            Err(SpiError::LengthMismatch { .. })
        ));
    }
}
