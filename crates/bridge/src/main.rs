//! ADC-to-UDP Telemetry Bridge - Main Entry Point

use anyhow::Context;
use bridge::config::BridgeConfig;
use bridge::control::Controls;
use bridge::{acquire, forward, init_logging, signal};
use clap::Parser;
use ring_buffer::RingBuffer;
use spi_bus::{SpiConfig, SpiDevice};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use udp_sink::UdpSink;

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = BridgeConfig::parse();

    let controls = Arc::new(Controls::new());
    signal::install_sigint(Arc::clone(&controls))
        .context("failed to install SIGINT handler")?;

    let bus = SpiDevice::open(SpiConfig {
        channel: config.spi_ch,
        speed_hz: config.spi_freq,
        ..Default::default()
    })
    .context("SPI device setup failed")?;

    let sink = UdpSink::connect(&config.sendto_ip, config.sendto_port)
        .context("transport connect failed")?;

    let buffer = Arc::new(
        RingBuffer::<u16>::new(config.buflen as usize)
            .context("ring buffer setup failed")?,
    );
    let send_timing = config.effective_send_timing();

    info!(
        buflen = config.buflen,
        spi_ch = config.spi_ch,
        spi_freq = config.spi_freq,
        destination = %format!("{}:{}", config.sendto_ip, config.sendto_port),
        send_timing,
        "starting bridge"
    );

    let send_thread = {
        let buffer = Arc::clone(&buffer);
        let controls = Arc::clone(&controls);
        std::thread::spawn(move || {
            forward::run_forwarder(&sink, &buffer, &controls, send_timing)
        })
    };
    let acquire_thread = {
        let buffer = Arc::clone(&buffer);
        let controls = Arc::clone(&controls);
        let mut bus = bus;
        std::thread::spawn(move || {
            acquire::run_acquisition(&mut bus, &buffer, &controls, send_timing)
        })
    };

    info!("press 'q' to terminate");
    wait_for_quit(&controls);
    controls.request_shutdown();

    if send_thread.join().is_err() {
        error!("send thread panicked");
    }
    if acquire_thread.join().is_err() {
        error!("acquisition thread panicked");
    }

    info!("bridge stopped");
    Ok(())
}

/// Block until 'q' is read on stdin or cancellation is raised elsewhere.
///
/// SIGINT interrupts the blocking read (no SA_RESTART), so the flag check
/// runs again right after the handler fires. On EOF stdin is gone and the
/// cancellation flag is the only exit left, so fall back to polling it.
fn wait_for_quit(controls: &Controls) {
    let stdin = std::io::stdin();
    let mut handle = stdin.lock();
    let mut byte = [0u8; 1];

    while !controls.is_cancelled() {
        match handle.read(&mut byte) {
            Ok(0) => {
                while !controls.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(100));
                }
                return;
            }
            Ok(_) if byte[0] == b'q' => return,
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                error!(%err, "stdin read failed, shutting down");
                return;
            }
        }
    }
}
