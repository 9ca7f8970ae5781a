use glimpse_core::{Clock, TimerQueue};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn starting_at(millis: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(millis)),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.set(millis);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(millis(by)));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}

/// Deterministic time source plus the timer queue driven by it.
///
/// Advancing the timeline steps the clock to each pending deadline in order
/// and fires the timers due at that instant, so callbacks observe the time
/// they were scheduled for.
pub struct TestTimeline {
    clock: ManualClock,
    timers: TimerQueue,
}

impl TestTimeline {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(millis: u64) -> Self {
        let clock = ManualClock::starting_at(millis);
        let timers = TimerQueue::new(Rc::new(clock.clone()));
        Self { clock, timers }
    }

    pub fn timers(&self) -> TimerQueue {
        self.timers.clone()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::new(self.clock.clone())
    }

    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Moves time forward to `millis`, firing timers along the way. Returns
    /// the number of timers fired.
    pub fn advance_to(&self, millis: u64) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.timers.next_deadline() {
            if deadline > millis {
                break;
            }
            self.clock.set(deadline.max(self.now()));
            fired += self.timers.run_due();
        }
        self.clock.set(millis.max(self.now()));
        fired + self.timers.run_due()
    }

    pub fn advance_by(&self, by: Duration) -> usize {
        self.advance_to(self.now().saturating_add(millis(by)))
    }

    pub fn advance_ms(&self, millis: u64) -> usize {
        self.advance_to(self.now().saturating_add(millis))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for TestTimeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn timers_fire_at_their_deadline() {
        let timeline = TestTimeline::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let clock = timeline.clock();
        let _late = {
            let seen = Rc::clone(&seen);
            let clock = Rc::clone(&clock);
            timeline
                .timers()
                .schedule(Duration::from_millis(80), move || seen.borrow_mut().push(clock.now_millis()))
        };
        let _early = {
            let seen = Rc::clone(&seen);
            timeline
                .timers()
                .schedule(Duration::from_millis(30), move || seen.borrow_mut().push(clock.now_millis()))
        };

        assert_eq!(timeline.advance_ms(100), 2);
        assert_eq!(*seen.borrow(), vec![30, 80]);
        assert_eq!(timeline.now(), 100);
    }
}
