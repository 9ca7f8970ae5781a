//! Host services consumed by the runtime.
//!
//! Everything in Glimpse runs on the UI thread, so these traits carry no
//! `Send`/`Sync` bounds. Hosts with a real event loop use [`SystemClock`];
//! tests drive time by hand through a manual clock.

use web_time::Instant;

/// Provides timing information for timers and measurement timestamps.
pub trait Clock {
    /// Milliseconds elapsed since a fixed, clock-specific origin.
    fn now_millis(&self) -> u64;
}

/// Monotonic wall clock anchored at construction time.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_millis();
        let second = clock.now_millis();
        assert!(second >= first);
    }
}
