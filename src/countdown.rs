use std::time::{Duration, Instant};

/// Time-mode clock. Lives next to the session, not inside it: the event
/// loop ticks it while the test runs and completes the test once it expires.
#[derive(Debug, Clone)]
pub struct Countdown {
    total: Duration,
    remaining: Duration,
    last_tick: Option<Instant>,
    paused: bool,
    cancelled: bool,
}

impl Countdown {
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            remaining: total,
            last_tick: None,
            paused: false,
            cancelled: false,
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(secs)))
    }

    /// Counts down by the wall time since the previous tick.
    /// The first tick after creation or resume only sets the reference point.
    pub fn tick(&mut self, now: Instant) {
        if self.paused || self.cancelled {
            return;
        }
        if let Some(last) = self.last_tick {
            let delta = now.saturating_duration_since(last);
            self.remaining = self.remaining.saturating_sub(delta);
        }
        self.last_tick = Some(now);
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.last_tick = None;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stops the countdown for good; later ticks do nothing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.last_tick = None;
    }

    pub fn is_expired(&self) -> bool {
        !self.cancelled && self.remaining.is_zero()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}
