//! Rate limiting for UI event handlers.
//!
//! [`Throttle`] runs the wrapped function at most once per interval. A call
//! that arrives too early is remembered, and a single trailing invocation is
//! scheduled on the [`TimerQueue`] for the remainder of the interval. When that
//! timer fires it uses the arguments of the most recent call, not the call that
//! scheduled it.

use crate::timer::{TimerQueue, TimerRegistration};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

struct ThrottleState<A> {
    last_invoked: Option<u64>,
    pending_args: Option<A>,
    timer: Option<TimerRegistration>,
}

struct ThrottleInner<A> {
    timers: TimerQueue,
    interval_ms: u64,
    func: RefCell<Box<dyn FnMut(A)>>,
    state: RefCell<ThrottleState<A>>,
}

/// Wraps a function so it runs at most once per `interval`.
///
/// The throttle owns its pending timer: dropping it (or calling
/// [`Throttle::cancel`]) guarantees the wrapped function is not invoked again.
/// The wrapped function must not call back into the same throttle.
pub struct Throttle<A: 'static> {
    inner: Rc<ThrottleInner<A>>,
}

impl<A: 'static> Throttle<A> {
    pub fn new(timers: TimerQueue, interval: Duration, func: impl FnMut(A) + 'static) -> Self {
        Self {
            inner: Rc::new(ThrottleInner {
                timers,
                interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                func: RefCell::new(Box::new(func)),
                state: RefCell::new(ThrottleState {
                    last_invoked: None,
                    pending_args: None,
                    timer: None,
                }),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.inner.interval_ms)
    }

    pub fn call(&self, args: A) {
        let now = self.inner.timers.now_millis();
        let immediate = {
            let mut state = self.inner.state.borrow_mut();
            match state.last_invoked {
                Some(last) if now.saturating_sub(last) < self.inner.interval_ms => {
                    state.pending_args = Some(args);
                    if state.timer.is_none() {
                        let remaining = self.inner.interval_ms - now.saturating_sub(last);
                        let weak = Rc::downgrade(&self.inner);
                        state.timer = Some(self.inner.timers.schedule(
                            Duration::from_millis(remaining),
                            move || {
                                if let Some(inner) = weak.upgrade() {
                                    inner.fire_trailing();
                                }
                            },
                        ));
                    }
                    None
                }
                _ => {
                    state.last_invoked = Some(now);
                    Some(args)
                }
            }
        };
        if let Some(args) = immediate {
            self.inner.invoke(args);
        }
    }

    /// Drops any pending trailing invocation. Safe to call repeatedly.
    pub fn cancel(&self) {
        let timer = {
            let mut state = self.inner.state.borrow_mut();
            state.pending_args = None;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
    }

    /// Whether a trailing invocation is scheduled.
    pub fn has_pending(&self) -> bool {
        self.inner.state.borrow().timer.is_some()
    }
}

impl<A> ThrottleInner<A> {
    fn fire_trailing(&self) {
        let now = self.timers.now_millis();
        let (args, _fired_timer) = {
            let mut state = self.state.borrow_mut();
            let timer = state.timer.take();
            let args = state.pending_args.take();
            if args.is_some() {
                state.last_invoked = Some(now);
            }
            (args, timer)
        };
        if let Some(args) = args {
            self.invoke(args);
        }
    }

    fn invoke(&self, args: A) {
        let mut func = self.func.borrow_mut();
        (&mut *func)(args);
    }
}

impl<A: 'static> Drop for Throttle<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}
