//! UDP Sample Sink
//!
//! Forwards sample windows to a preconfigured remote host as raw datagrams.
//! The payload is the ordered byte image of the samples exactly as the bus
//! device produced them: no header, no transformation, no acknowledgment.

use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from transport setup and sends
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination could not be resolved or the socket could not be set up
    #[error("failed to connect to {destination}: {source}")]
    Connect {
        destination: String,
        source: std::io::Error,
    },

    /// A datagram send failed
    #[error("send failed: {0}")]
    Send(std::io::Error),
}

/// Destination for snapshot windows drained from the ring buffer.
///
/// A send may block and may fail; the core never retries it.
pub trait SampleSink: Send {
    fn send(&self, samples: &[u16]) -> Result<(), SinkError>;
}

/// Cap on how long a single send may block; a shutdown request is never
/// stalled longer than this on an in-flight datagram.
const SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Connected UDP socket sending one datagram per snapshot window
pub struct UdpSink {
    socket: UdpSocket,
    destination: String,
}

impl UdpSink {
    /// Bind an ephemeral local socket and connect it to `host:port`.
    ///
    /// Resolution and socket setup failures are fatal to the caller; there
    /// is no reconnect path.
    pub fn connect(host: &str, port: u16) -> Result<Self, SinkError> {
        let destination = format!("{host}:{port}");
        let connect_err = |source| SinkError::Connect {
            destination: destination.clone(),
            source,
        };

        // Resolve eagerly so a bad destination fails at setup, not mid-run.
        destination
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::from(std::io::ErrorKind::AddrNotAvailable))
            })?;

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(connect_err)?;
        socket.connect(&destination).map_err(connect_err)?;
        socket
            .set_write_timeout(Some(SEND_TIMEOUT))
            .map_err(connect_err)?;

        info!(%destination, "UDP sink connected");
        Ok(Self {
            socket,
            destination,
        })
    }

    /// Destination address the sink was connected to.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl SampleSink for UdpSink {
    fn send(&self, samples: &[u16]) -> Result<(), SinkError> {
        let mut payload = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            // Native byte order: the u16 was assembled from the raw bus
            // bytes the same way, so the wire image matches the device.
            payload.extend_from_slice(&sample.to_ne_bytes());
        }
        let sent = self.socket.send(&payload).map_err(SinkError::Send)?;
        debug!(samples = samples.len(), bytes = sent, "sent window");
        Ok(())
    }
}

/// Test sink recording every window it is handed
#[derive(Default)]
pub struct MemorySink {
    windows: std::sync::Mutex<Vec<Vec<u16>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All windows sent so far, in order.
    pub fn windows(&self) -> Vec<Vec<u16>> {
        self.windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl SampleSink for MemorySink {
    fn send(&self, samples: &[u16]) -> Result<(), SinkError> {
        self.windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(samples.to_vec());
        Ok(())
    }
}
