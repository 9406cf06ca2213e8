//! Send Loop
//!
//! Waits for the send trigger, drains the most recent `send_timing` samples
//! from the ring buffer and forwards them to the sink, then disarms the
//! trigger. Never sends unless triggered.

use crate::control::Controls;
use ring_buffer::RingBuffer;
use std::time::Duration;
use tracing::{error, info, warn};

/// Upper bound on one trigger wait; cancellation is re-checked at least
/// this often even if the trigger never fires.
const TRIGGER_WAIT: Duration = Duration::from_millis(50);

/// Run the send loop until cancellation.
///
/// `send_timing` must already be clamped to the buffer capacity. A failed
/// send is logged and dropped; UDP gives no delivery guarantee anyway, so
/// the loop carries on with the next trigger.
pub fn run_forwarder(
    sink: &dyn udp_sink::SampleSink,
    buffer: &RingBuffer<u16>,
    controls: &Controls,
    send_timing: u32,
) {
    info!(send_timing, "send loop started");

    while !controls.is_cancelled() {
        if !controls.wait_armed(TRIGGER_WAIT) {
            continue;
        }
        if controls.force_return_requested() {
            break;
        }

        match buffer.snapshot_n(send_timing as usize) {
            Ok(window) => {
                if let Err(err) = sink.send(&window) {
                    warn!(%err, "window send failed, dropping");
                }
            }
            Err(err) => {
                // Only possible if the period was never clamped; nothing
                // sensible can be sent, so stop the pipeline.
                error!(%err, "invalid snapshot request, requesting shutdown");
                controls.request_shutdown();
            }
        }
        controls.disarm_trigger();
    }

    info!("send loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use udp_sink::MemorySink;

    fn wait_for_windows(sink: &MemorySink, count: usize) -> Vec<Vec<u16>> {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            let windows = sink.windows();
            if windows.len() >= count || std::time::Instant::now() > deadline {
                return windows;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn spawn_forwarder(
        sink: Arc<MemorySink>,
        buffer: Arc<RingBuffer<u16>>,
        controls: Arc<Controls>,
        send_timing: u32,
    ) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            run_forwarder(sink.as_ref(), &buffer, &controls, send_timing)
        })
    }

    #[test]
    fn drains_only_when_triggered() {
        let sink = Arc::new(MemorySink::new());
        let buffer = Arc::new(RingBuffer::new(8).unwrap());
        let controls = Arc::new(Controls::new());
        let worker = spawn_forwarder(
            Arc::clone(&sink),
            Arc::clone(&buffer),
            Arc::clone(&controls),
            4,
        );

        buffer.append_many(&[1, 2, 3, 4]);
        std::thread::sleep(Duration::from_millis(100));
        assert!(sink.windows().is_empty(), "sent without a trigger");

        controls.arm_trigger();
        let windows = wait_for_windows(&sink, 1);
        assert_eq!(windows, vec![vec![1, 2, 3, 4]]);

        controls.request_shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn two_arms_before_drain_coalesce() {
        let sink = Arc::new(MemorySink::new());
        let buffer = Arc::new(RingBuffer::new(8).unwrap());
        let controls = Arc::new(Controls::new());

        buffer.append_many(&[1, 2, 3, 4]);
        controls.arm_trigger();
        controls.arm_trigger();

        let worker = spawn_forwarder(
            Arc::clone(&sink),
            Arc::clone(&buffer),
            Arc::clone(&controls),
            4,
        );

        let windows = wait_for_windows(&sink, 1);
        assert_eq!(windows.len(), 1);
        // Give a second drain time to happen if the arms did not coalesce.
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(sink.windows().len(), 1);

        controls.request_shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn shutdown_unblocks_an_idle_forwarder() {
        let sink = Arc::new(MemorySink::new());
        let buffer = Arc::new(RingBuffer::new(8).unwrap());
        let controls = Arc::new(Controls::new());
        let worker = spawn_forwarder(
            Arc::clone(&sink),
            Arc::clone(&buffer),
            Arc::clone(&controls),
            4,
        );

        std::thread::sleep(Duration::from_millis(20));
        controls.request_shutdown();
        worker.join().unwrap();
        assert!(sink.windows().is_empty());
    }
}
