//! Ring Buffer Implementation

use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors from ring buffer construction and snapshot requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Capacity must be at least one sample
    #[error("ring buffer capacity must be non-zero")]
    ZeroCapacity,

    /// Snapshot length outside (0, capacity]
    #[error("snapshot length {requested} out of range (0, {capacity}]")]
    BadSnapshotLen { requested: usize, capacity: usize },
}

struct Inner<T> {
    /// Pre-allocated storage, zero-seeded via `Default`
    storage: Box<[T]>,
    /// Next slot to overwrite; the logical window starts here
    head: usize,
}

/// Fixed-capacity rolling window over the most recent `capacity` samples.
///
/// Appends overwrite the oldest retained sample once the buffer has wrapped.
/// Every operation takes the same internal mutex, so a snapshot observes all
/// appends that completed before it began and none that start after it
/// returns. Critical sections are O(capacity) at worst and never perform I/O.
pub struct RingBuffer<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a buffer holding `capacity` samples, seeded with `T::default()`.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let storage: Vec<T> = (0..capacity).map(|_| T::default()).collect();
        Ok(Self {
            inner: Mutex::new(Inner {
                storage: storage.into_boxed_slice(),
                head: 0,
            }),
            capacity,
        })
    }

    /// Buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one sample at the write cursor and advance it modulo capacity.
    pub fn append(&self, sample: T) {
        let mut inner = self.lock();
        Self::append_unlocked(&mut inner, self.capacity, sample);
    }

    /// Append a batch of samples under a single lock acquisition.
    ///
    /// Observably equivalent to sequential `append` calls; a concurrent
    /// snapshot sees either none or all of the batch.
    pub fn append_many(&self, samples: &[T]) {
        let mut inner = self.lock();
        for &sample in samples {
            Self::append_unlocked(&mut inner, self.capacity, sample);
        }
    }

    /// Copy out the `n` most recently written samples, oldest first.
    ///
    /// Slots that have never been written read back as the zero seed.
    /// `n` must be in (0, capacity].
    pub fn snapshot_n(&self, n: usize) -> Result<Vec<T>, BufferError> {
        if n == 0 || n > self.capacity {
            return Err(BufferError::BadSnapshotLen {
                requested: n,
                capacity: self.capacity,
            });
        }
        let inner = self.lock();
        // The newest sample sits just behind head, so the n-sample window
        // starts n slots behind it.
        let start = (inner.head + self.capacity - n) % self.capacity;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            out.push(inner.storage[(start + i) % self.capacity]);
        }
        Ok(out)
    }

    /// Copy out the full window in insertion order plus the wrap point.
    ///
    /// The returned index is the current write cursor: the slot the next
    /// append will overwrite, and the position of the oldest sample.
    pub fn snapshot_all(&self) -> (Vec<T>, usize) {
        let inner = self.lock();
        let mut out = Vec::with_capacity(self.capacity);
        for i in 0..self.capacity {
            out.push(inner.storage[(inner.head + i) % self.capacity]);
        }
        (out, inner.head)
    }

    fn append_unlocked(inner: &mut Inner<T>, capacity: usize, sample: T) {
        let head = inner.head;
        inner.storage[head] = sample;
        inner.head = (head + 1) % capacity;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<T>> {
        // Samples are Copy, so a panic mid-write cannot leave the window in
        // an invalid state; recover the guard instead of propagating poison.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
