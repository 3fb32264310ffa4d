//! Periodic scheduling for the dashboard refresh.
//!
//! The monitor does not busy-loop with a bare sleep; it waits on a `Ticker`
//! driven by a `Clock` so tests can run the schedule without wall-clock
//! delays. Missed deadlines are skipped, not replayed.

use std::time::{Duration, Instant};

/// Time source seam. `SystemClock` in production, a manual fake in tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fixed-period ticker anchored to absolute deadlines, so the refresh rate
/// does not drift with the time spent drawing.
pub struct Ticker<C: Clock> {
    clock: C,
    period: Duration,
    deadline: Instant,
}

impl<C: Clock> Ticker<C> {
    pub fn new(clock: C, period: Duration) -> Self {
        let deadline = clock.now() + period;
        Self {
            clock,
            period,
            deadline,
        }
    }

    /// Sleep until the next deadline, then advance it. If the caller overran
    /// one or more periods, the missed deadlines are dropped and the next
    /// one is scheduled in the future.
    pub fn wait(&mut self) {
        let now = self.clock.now();
        if now < self.deadline {
            self.clock.sleep(self.deadline - now);
        }

        self.deadline += self.period;
        let now = self.clock.now();
        while self.deadline <= now {
            self.deadline += self.period;
        }
    }
}
