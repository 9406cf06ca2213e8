//! Bounded Concurrent Ring Buffer
//!
//! Fixed-capacity rolling window shared between a single writer (the
//! acquisition loop) and a single reader (the send loop). All access goes
//! through one internal mutex; snapshots always copy, so a reader never
//! holds a reference into live storage.

mod buffer;

pub use buffer::{BufferError, RingBuffer};
