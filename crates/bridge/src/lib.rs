//! ADC-to-UDP Telemetry Bridge
//!
//! Samples an ADC over SPI into a fixed-capacity rolling window and forwards
//! the most recent window to a remote host over UDP every N samples. Two
//! worker threads share the ring buffer: the acquisition loop is the sole
//! writer, the send loop the sole reader; a coalescing send trigger and a
//! one-shot cancellation flag connect them.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub mod acquire;
pub mod config;
pub mod control;
pub mod forward;
pub mod signal;

/// Initialize the global tracing subscriber.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
