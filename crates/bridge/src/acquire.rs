//! Acquisition Loop
//!
//! Drives the bus device and feeds the ring buffer: one full-duplex
//! transfer per iteration, one sample appended per transfer, and a send
//! trigger raised every `send_timing` samples.

use crate::control::Controls;
use ring_buffer::RingBuffer;
use spi_bus::BusDevice;
use tracing::{error, info, warn};

/// Fixed command word shifted out on every exchange: start bit plus
/// single-ended channel selection for the ADC, second byte clocks the
/// reply in.
pub const ADC_READ_COMMAND: [u8; 2] = [0b0110_0000, 0x00];

/// Consecutive transfer failures after which the bus is declared dead and
/// shutdown is requested.
const MAX_CONSECUTIVE_BUS_ERRORS: u32 = 8;

/// Run the acquisition loop until cancellation.
///
/// `send_timing` must already be clamped to the buffer capacity. A single
/// failed transfer is logged and skipped; a run of
/// `MAX_CONSECUTIVE_BUS_ERRORS` failures is treated as fatal and raises the
/// cancellation flag.
pub fn run_acquisition(
    bus: &mut dyn BusDevice,
    buffer: &RingBuffer<u16>,
    controls: &Controls,
    send_timing: u32,
) {
    let mut since_trigger: u32 = 0;
    let mut consecutive_errors: u32 = 0;
    let mut rx = [0u8; 2];

    info!(send_timing, "acquisition loop started");

    while !controls.is_cancelled() {
        match bus.transfer(&ADC_READ_COMMAND, &mut rx) {
            Ok(()) => {
                consecutive_errors = 0;
                // The reply bytes are stored and forwarded in device byte
                // order; no endian transform anywhere on the path.
                buffer.append(u16::from_ne_bytes(rx));
                since_trigger += 1;
                if since_trigger >= send_timing {
                    controls.arm_trigger();
                    since_trigger = 0;
                }
            }
            Err(err) => {
                consecutive_errors += 1;
                warn!(%err, consecutive_errors, "bus transfer failed");
                if consecutive_errors >= MAX_CONSECUTIVE_BUS_ERRORS {
                    error!(
                        failures = consecutive_errors,
                        "bus unresponsive, requesting shutdown"
                    );
                    controls.request_shutdown();
                }
            }
        }
    }

    info!("acquisition loop stopped");
}
