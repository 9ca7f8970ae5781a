use crate::collections::map::HashMap;
use crate::platform::Clock;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type TimerId = u64;

type TimerCallback = Box<dyn FnOnce()>;

struct TimerQueueInner {
    clock: Rc<dyn Clock>,
    next_id: Cell<TimerId>,
    // Ordered by deadline, then by scheduling order.
    order: RefCell<BTreeSet<(u64, TimerId)>>,
    callbacks: RefCell<HashMap<TimerId, (u64, TimerCallback)>>,
}

/// Single-threaded queue of delayed callbacks.
///
/// The host pumps the queue with [`TimerQueue::run_due`] from its event loop;
/// nothing fires on its own. Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    inner: Rc<TimerQueueInner>,
}

impl TimerQueue {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(TimerQueueInner {
                clock,
                next_id: Cell::new(1),
                order: RefCell::new(BTreeSet::new()),
                callbacks: RefCell::new(HashMap::default()),
            }),
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.inner.clock.now_millis()
    }

    /// Schedules `callback` to run once `delay` has elapsed.
    ///
    /// Dropping the returned registration cancels the callback.
    pub fn schedule(
        &self,
        delay: Duration,
        callback: impl FnOnce() + 'static,
    ) -> TimerRegistration {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let deadline = self
            .now_millis()
            .saturating_add(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self.inner.order.borrow_mut().insert((deadline, id));
        self.inner
            .callbacks
            .borrow_mut()
            .insert(id, (deadline, Box::new(callback)));
        log::trace!("timer {id} scheduled for t={deadline}ms");
        TimerRegistration {
            queue: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Runs every callback whose deadline has passed and returns how many ran.
    ///
    /// Timers scheduled by a callback during this pass wait for the next pass,
    /// so a callback that keeps rescheduling itself cannot starve the host.
    pub fn run_due(&self) -> usize {
        let now = self.now_millis();
        let id_limit = self.inner.next_id.get();
        let mut fired = 0;
        loop {
            let next = {
                let mut order = self.inner.order.borrow_mut();
                let due = order
                    .iter()
                    .take_while(|(deadline, _)| *deadline <= now)
                    .find(|(_, id)| *id < id_limit)
                    .copied();
                if let Some(entry) = due {
                    order.remove(&entry);
                }
                due
            };
            let Some((_, id)) = next else {
                break;
            };
            let callback = self.inner.callbacks.borrow_mut().remove(&id);
            if let Some((_, callback)) = callback {
                callback();
                fired += 1;
            }
        }
        fired
    }

    /// Earliest pending deadline, in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.inner
            .order
            .borrow()
            .iter()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }
}

impl TimerQueueInner {
    fn cancel(&self, id: TimerId) {
        let removed = self.callbacks.borrow_mut().remove(&id);
        if let Some((deadline, _)) = removed {
            self.order.borrow_mut().remove(&(deadline, id));
            log::trace!("timer {id} cancelled");
        }
    }

    fn contains(&self, id: TimerId) -> bool {
        self.callbacks.borrow().contains_key(&id)
    }
}

/// Handle to a scheduled callback; cancels it on drop.
///
/// Cancelling a timer that already fired, or cancelling twice, does nothing.
#[must_use = "dropping a TimerRegistration cancels the timer"]
pub struct TimerRegistration {
    queue: Weak<TimerQueueInner>,
    id: Option<TimerId>,
}

impl TimerRegistration {
    pub fn id(&self) -> Option<TimerId> {
        self.id
    }

    /// Whether the callback is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        match (self.id, self.queue.upgrade()) {
            (Some(id), Some(queue)) => queue.contains(id),
            _ => false,
        }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(queue) = self.queue.upgrade() {
                queue.cancel(id);
            }
        }
    }
}

impl Drop for TimerRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(Rc<Cell<u64>>);

    impl Clock for FixedClock {
        fn now_millis(&self) -> u64 {
            self.0.get()
        }
    }

    fn queue() -> (TimerQueue, Rc<Cell<u64>>) {
        let now = Rc::new(Cell::new(0));
        let queue = TimerQueue::new(Rc::new(FixedClock(Rc::clone(&now))));
        (queue, now)
    }

    #[test]
    fn fires_in_deadline_order() {
        let (queue, now) = queue();
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = {
            let log = Rc::clone(&log);
            queue.schedule(Duration::from_millis(30), move || log.borrow_mut().push("late"))
        };
        let early = {
            let log = Rc::clone(&log);
            queue.schedule(Duration::from_millis(10), move || log.borrow_mut().push("early"))
        };
        assert_eq!(queue.next_deadline(), Some(10));

        now.set(5);
        assert_eq!(queue.run_due(), 0);

        now.set(30);
        assert_eq!(queue.run_due(), 2);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert!(!early.is_pending());
        assert!(!late.is_pending());
    }

    #[test]
    fn dropping_registration_cancels() {
        let (queue, now) = queue();
        let fired = Rc::new(Cell::new(false));
        let registration = {
            let fired = Rc::clone(&fired);
            queue.schedule(Duration::from_millis(1), move || fired.set(true))
        };
        assert!(registration.is_pending());
        drop(registration);
        now.set(10);
        assert_eq!(queue.run_due(), 0);
        assert!(!fired.get());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn huge_delays_saturate_at_the_end_of_time() {
        let (queue, now) = queue();
        now.set(50);
        let _forever = queue.schedule(Duration::MAX, || {});
        let _long = queue.schedule(Duration::from_secs(u64::MAX / 500), || {});
        assert_eq!(queue.next_deadline(), Some(u64::MAX));
        now.set(u64::MAX - 1);
        assert_eq!(queue.run_due(), 0);
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let (queue, now) = queue();
        let registration = queue.schedule(Duration::ZERO, || {});
        now.set(1);
        assert_eq!(queue.run_due(), 1);
        registration.cancel();
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn timers_scheduled_while_running_wait_for_next_pass() {
        let (queue, _now) = queue();
        let nested: Rc<RefCell<Option<TimerRegistration>>> = Rc::new(RefCell::new(None));
        let _outer = {
            let queue_for_cb = queue.clone();
            let nested = Rc::clone(&nested);
            queue.schedule(Duration::ZERO, move || {
                let registration = queue_for_cb.schedule(Duration::ZERO, || {});
                nested.borrow_mut().replace(registration);
            })
        };
        assert_eq!(queue.run_due(), 1);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.run_due(), 1);
    }
}
