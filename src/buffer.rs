//! Shared interval buffer between the pulse reader and the live monitor.
//!
//! The buffer is a fixed-capacity ring of interval deltas, exclusively
//! mutated by the reader and read by the monitor through a lock-guarded
//! snapshot copy. Critical sections stay minimal: a single slot write on
//! the producer side, a full-buffer copy on the consumer side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default window size, matching the reference bench rig.
pub const DEFAULT_CAPACITY: usize = 25;

/// Fixed-capacity ring of interval deltas.
///
/// Initialized all-zero; a zero slot doubles as "no data yet", which the
/// positive filter downstream discards. The logical size is always exactly
/// the capacity.
#[derive(Debug)]
pub struct IntervalBuffer {
    slots: Vec<i64>,
    cursor: usize,
}

impl IntervalBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Overwrite the slot under the cursor and advance it modulo capacity.
    pub fn write(&mut self, delta: i64) {
        self.slots[self.cursor] = delta;
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Full copy for lock-free processing by the consumer.
    pub fn snapshot(&self) -> Vec<i64> {
        self.slots.clone()
    }
}

/// The one shared resource between the two threads.
pub type SharedIntervalBuffer = Arc<Mutex<IntervalBuffer>>;

pub fn shared(capacity: usize) -> SharedIntervalBuffer {
    Arc::new(Mutex::new(IntervalBuffer::new(capacity)))
}

/// Line totals kept by the reader, readable by the monitor for the
/// dashboard and the exit summary.
#[derive(Debug, Default)]
pub struct ReaderCounters {
    accepted: AtomicU64,
    discarded: AtomicU64,
}

impl ReaderCounters {
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}
