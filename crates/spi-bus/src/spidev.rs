//! Linux spidev Device Implementation
//!
//! Talks to `/dev/spidev0.<channel>` through the kernel's spidev ioctl
//! interface: mode, word size and clock speed are applied once at open, and
//! each `transfer` issues a single `SPI_IOC_MESSAGE` full-duplex exchange.

use crate::{BusDevice, SpiConfig, SpiError};

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use std::ffi::CString;
    use std::os::unix::io::RawFd;
    use tracing::{debug, info};

    const SPI_IOC_MAGIC: u32 = b'k' as u32;
    const IOC_WRITE: u64 = 1;

    // _IOW(SPI_IOC_MAGIC, nr, size)
    const fn spi_iow(nr: u64, size: u64) -> u64 {
        (IOC_WRITE << 30) | (size << 16) | ((SPI_IOC_MAGIC as u64) << 8) | nr
    }

    const SPI_IOC_WR_MODE: u64 = spi_iow(1, 1);
    const SPI_IOC_WR_BITS_PER_WORD: u64 = spi_iow(3, 1);
    const SPI_IOC_WR_MAX_SPEED_HZ: u64 = spi_iow(4, 4);
    const SPI_IOC_MESSAGE_1: u64 =
        spi_iow(0, std::mem::size_of::<SpiIocTransfer>() as u64);

    /// Kernel `struct spi_ioc_transfer` (include/uapi/linux/spi/spidev.h)
    #[repr(C)]
    #[derive(Default)]
    struct SpiIocTransfer {
        tx_buf: u64,
        rx_buf: u64,
        len: u32,
        speed_hz: u32,
        delay_usecs: u16,
        bits_per_word: u8,
        cs_change: u8,
        tx_nbits: u8,
        rx_nbits: u8,
        word_delay_usecs: u8,
        pad: u8,
    }

    /// Open SPI device on bus 0 with the given chip-select channel
    pub struct SpiDevice {
        fd: RawFd,
        config: SpiConfig,
    }

    impl SpiDevice {
        /// Open the spidev node and apply mode, word size and clock speed.
        pub fn open(config: SpiConfig) -> Result<Self, SpiError> {
            let path = format!("/dev/spidev0.{}", config.channel);
            let c_path = CString::new(path.clone()).map_err(|_| SpiError::Open {
                device: path.clone(),
                source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
            })?;

            let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR) };
            if fd < 0 {
                return Err(SpiError::Open {
                    device: path,
                    source: std::io::Error::last_os_error(),
                });
            }

            let device = Self { fd, config };
            device.write_ioctl(SPI_IOC_WR_MODE, &device.config.mode, "SPI mode")?;
            device.write_ioctl(
                SPI_IOC_WR_BITS_PER_WORD,
                &device.config.bits_per_word,
                "bits per word",
            )?;
            device.write_ioctl(
                SPI_IOC_WR_MAX_SPEED_HZ,
                &device.config.speed_hz,
                "clock speed",
            )?;

            info!(
                channel = device.config.channel,
                speed_hz = device.config.speed_hz,
                mode = device.config.mode,
                "opened SPI device"
            );
            Ok(device)
        }

        fn write_ioctl<T>(
            &self,
            request: u64,
            value: &T,
            setting: &'static str,
        ) -> Result<(), SpiError> {
            let ret = unsafe {
                libc::ioctl(
                    self.fd,
                    request as libc::c_ulong,
                    value as *const T,
                )
            };
            if ret < 0 {
                return Err(SpiError::Configure {
                    setting,
                    source: std::io::Error::last_os_error(),
                });
            }
            Ok(())
        }
    }

    impl BusDevice for SpiDevice {
        fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpiError> {
            if tx.len() != rx.len() {
                return Err(SpiError::LengthMismatch {
                    tx_len: tx.len(),
                    rx_len: rx.len(),
                });
            }

            let xfer = SpiIocTransfer {
                tx_buf: tx.as_ptr() as u64,
                rx_buf: rx.as_mut_ptr() as u64,
                len: tx.len() as u32,
                speed_hz: self.config.speed_hz,
                bits_per_word: self.config.bits_per_word,
                ..Default::default()
            };

            let ret = unsafe {
                libc::ioctl(self.fd, SPI_IOC_MESSAGE_1 as libc::c_ulong, &xfer)
            };
            if ret < 0 {
                return Err(SpiError::Transfer(std::io::Error::last_os_error()));
            }
            Ok(())
        }
    }

    impl Drop for SpiDevice {
        fn drop(&mut self) {
            debug!(channel = self.config.channel, "closing SPI device");
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::SpiDevice;

#[cfg(not(target_os = "linux"))]
mod stub {
    use super::*;

    /// spidev is Linux-only; this stub keeps the crate building elsewhere
    /// so the mock-backed tests and tooling still work.
    pub struct SpiDevice {
        _config: SpiConfig,
    }

    impl SpiDevice {
        pub fn open(_config: SpiConfig) -> Result<Self, SpiError> {
            Err(SpiError::Unsupported)
        }
    }

    impl BusDevice for SpiDevice {
        fn transfer(&mut self, _tx: &[u8], _rx: &mut [u8]) -> Result<(), SpiError> {
            Err(SpiError::Unsupported)
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub use stub::SpiDevice;
