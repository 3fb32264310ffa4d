//! Pulse reader: the producer side of the live monitor.
//!
//! The reader owns the serial connection for the session, parses each line
//! as a timestamp, and writes the delta from the previous accepted reading
//! into the shared buffer. Malformed lines are dropped on purpose — serial
//! noise and partial lines are expected on a bench — but every drop is
//! counted and debug-logged so it stays observable.

use crate::buffer::{ReaderCounters, SharedIntervalBuffer};
use crate::serial::SerialConnection;
use crate::shutdown;
use anyhow::{Context, Result};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Line-to-delta bookkeeping, separate from the serial connection so the
/// parsing and buffer semantics are testable without hardware.
pub struct DeltaTracker {
    buffer: SharedIntervalBuffer,
    counters: Arc<ReaderCounters>,
    /// Reader-private; only ever touched outside the lock. Starts at 0, so
    /// the first accepted reading produces one oversized delta that ages
    /// out of the window (reference behavior).
    last_accepted: i64,
}

impl DeltaTracker {
    pub fn new(buffer: SharedIntervalBuffer, counters: Arc<ReaderCounters>) -> Self {
        Self {
            buffer,
            counters,
            last_accepted: 0,
        }
    }

    /// Parse one line and, on success, write the interval delta into the
    /// shared buffer. A parse failure leaves the cursor and the last
    /// accepted value untouched.
    pub fn handle_line(&mut self, line: &str) {
        match line.trim().parse::<i64>() {
            Ok(timestamp) => {
                let delta = timestamp - self.last_accepted;
                self.buffer.lock().unwrap().write(delta);
                self.last_accepted = timestamp;
                self.counters.record_accepted();
            }
            Err(_) => {
                self.counters.record_discarded();
                debug!("discarding malformed line: {:?}", line);
            }
        }
    }
}

/// The producer thread body.
pub struct PulseReader {
    connection: SerialConnection,
    tracker: DeltaTracker,
    running: Arc<AtomicBool>,
}

impl PulseReader {
    pub fn new(
        connection: SerialConnection,
        buffer: SharedIntervalBuffer,
        counters: Arc<ReaderCounters>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            connection,
            tracker: DeltaTracker::new(buffer, counters),
            running,
        }
    }

    /// Read lines until the session stops or the port fails.
    ///
    /// A quiet read timeout is not an error; it only gives the loop a
    /// chance to re-check the running flag. Any other read error is fatal:
    /// there is no reconnect logic, so the reader clears the running flag
    /// to stop the monitor and returns the error for the foreground thread
    /// to surface.
    pub fn run(mut self) -> Result<()> {
        while self.running.load(Ordering::SeqCst) && !shutdown::requested() {
            match self.connection.read_line() {
                Ok(Some(line)) => self.tracker.handle_line(&line),
                Ok(None) => {}
                Err(e) => {
                    self.running.store(false, Ordering::SeqCst);
                    return Err(e).with_context(|| {
                        format!(
                            "serial connection lost on {}",
                            self.connection.config().port_path
                        )
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer;

    fn tracker_with_capacity(capacity: usize) -> (DeltaTracker, SharedIntervalBuffer, Arc<ReaderCounters>) {
        let buf = buffer::shared(capacity);
        let counters = Arc::new(ReaderCounters::default());
        let tracker = DeltaTracker::new(Arc::clone(&buf), Arc::clone(&counters));
        (tracker, buf, counters)
    }

    #[test]
    fn accepted_lines_become_deltas() {
        let (mut tracker, buf, counters) = tracker_with_capacity(4);

        tracker.handle_line("100");
        tracker.handle_line("350");
        tracker.handle_line("600");

        assert_eq!(buf.lock().unwrap().snapshot(), vec![100, 250, 250, 0]);
        assert_eq!(counters.accepted(), 3);
        assert_eq!(counters.discarded(), 0);
    }

    #[test]
    fn malformed_lines_advance_nothing() {
        let (mut tracker, buf, counters) = tracker_with_capacity(4);

        tracker.handle_line("100");
        tracker.handle_line("garbage");
        tracker.handle_line("");
        tracker.handle_line("12.5");
        tracker.handle_line("250");

        // The delta after the noise is 150, proving last_accepted stayed at
        // 100, and it landed in slot 1, proving the cursor never moved
        assert_eq!(buf.lock().unwrap().snapshot(), vec![100, 150, 0, 0]);
        assert_eq!(counters.accepted(), 2);
        assert_eq!(counters.discarded(), 3);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let (mut tracker, buf, counters) = tracker_with_capacity(2);

        tracker.handle_line("  300  ");
        tracker.handle_line("\t500");

        assert_eq!(buf.lock().unwrap().snapshot(), vec![300, 200]);
        assert_eq!(counters.discarded(), 0);
    }

    #[test]
    fn backwards_timestamps_store_negative_deltas() {
        // A device reset jumps backwards; the write stage records it as-is
        // and the positive filter discards it later
        let (mut tracker, buf, _) = tracker_with_capacity(4);

        tracker.handle_line("5000");
        tracker.handle_line("40");
        tracker.handle_line("540");

        assert_eq!(buf.lock().unwrap().snapshot(), vec![5000, -4960, 500, 0]);
    }

    #[test]
    fn window_wraps_after_capacity_accepted_lines() {
        let (mut tracker, buf, counters) = tracker_with_capacity(3);

        for i in 1..=5 {
            tracker.handle_line(&(i * 100).to_string());
        }

        // Deltas were [100, 100, 100, 100, 100]; the first two slots were
        // overwritten on wraparound
        assert_eq!(buf.lock().unwrap().snapshot(), vec![100, 100, 100]);
        assert_eq!(counters.accepted(), 5);
    }
}
