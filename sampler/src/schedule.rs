use std::time::{Duration, Instant};

use log::debug;

/// Fixed-rate pacing against the monotonic clock
///
/// Deadlines are `start + k * period`, so time spent inside an iteration does
/// not push later iterations back. An iteration that overruns skips the
/// deadlines it missed rather than firing them in a burst.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_deadline: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    pub fn starting_at(start: Instant, period: Duration) -> Self {
        Self {
            period,
            next_deadline: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Block until the next deadline. Returns how many deadlines were skipped.
    pub fn wait(&mut self) -> u32 {
        let now = Instant::now();
        if now < self.next_deadline {
            std::thread::sleep(self.next_deadline - now);
            self.next_deadline += self.period;
            return 0;
        }

        let late = now - self.next_deadline;
        let skipped = (late.as_nanos() / self.period.as_nanos().max(1)) as u32;
        self.next_deadline += self.period * (skipped + 1);
        debug!(
            "iteration overran by {:?}, skipping {} deadline(s)",
            late, skipped
        );
        skipped
    }
}
