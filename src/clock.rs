use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The time source of a run. Packet timestamps are read from it and pacing delays are applied
/// through it.
pub trait Clock {
    /// Current time since the Unix epoch
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time. Sleeping actually blocks the thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // the epoch is always in the past
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }

    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// A clock that only moves when slept on
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    pub fn starting_at(now: Duration) -> Self {
        VirtualClock { now }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
    }
}
