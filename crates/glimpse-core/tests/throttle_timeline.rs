//! Throttle and stable callback behavior driven by a manual timeline.

use glimpse_core::{Callback, Dep, StableCallback, Throttle};
use glimpse_testing::TestTimeline;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

type Invocations = Rc<RefCell<Vec<(u64, &'static str)>>>;

fn recording_throttle(timeline: &TestTimeline, interval_ms: u64) -> (Throttle<&'static str>, Invocations) {
    let invocations: Invocations = Rc::new(RefCell::new(Vec::new()));
    let clock = timeline.clock();
    let throttle = {
        let invocations = Rc::clone(&invocations);
        Throttle::new(
            timeline.timers(),
            Duration::from_millis(interval_ms),
            move |args| invocations.borrow_mut().push((clock.now_millis(), args)),
        )
    };
    (throttle, invocations)
}

#[test]
fn burst_runs_first_call_then_latest_arguments() {
    let timeline = TestTimeline::new();
    let (throttle, invocations) = recording_throttle(&timeline, 200);

    throttle.call("A");
    timeline.advance_to(50);
    throttle.call("B");
    timeline.advance_to(120);
    throttle.call("C");
    assert!(throttle.has_pending());

    timeline.advance_to(200);
    assert_eq!(*invocations.borrow(), vec![(0, "A"), (200, "C")]);
    assert!(!throttle.has_pending());

    timeline.advance_to(1_000);
    assert_eq!(invocations.borrow().len(), 2);
}

#[test]
fn trailing_invocation_restarts_the_interval() {
    let timeline = TestTimeline::new();
    let (throttle, invocations) = recording_throttle(&timeline, 100);

    throttle.call("first");
    timeline.advance_to(10);
    throttle.call("second");
    timeline.advance_to(100);
    timeline.advance_to(150);
    throttle.call("third");
    assert!(throttle.has_pending());
    timeline.advance_to(200);

    assert_eq!(
        *invocations.borrow(),
        vec![(0, "first"), (100, "second"), (200, "third")]
    );
}

#[test]
fn only_one_timer_is_pending_per_throttle() {
    let timeline = TestTimeline::new();
    let (throttle, _invocations) = recording_throttle(&timeline, 200);

    throttle.call("A");
    for t in [10, 20, 30, 40] {
        timeline.advance_to(t);
        throttle.call("again");
    }
    assert_eq!(timeline.timers().pending_count(), 1);
}

#[test]
fn dropping_the_throttle_cancels_the_trailing_call() {
    let timeline = TestTimeline::new();
    let (throttle, invocations) = recording_throttle(&timeline, 200);

    throttle.call("A");
    timeline.advance_to(50);
    throttle.call("B");
    drop(throttle);

    assert_eq!(timeline.timers().pending_count(), 0);
    timeline.advance_to(500);
    assert_eq!(*invocations.borrow(), vec![(0, "A")]);
}

#[test]
fn cancel_is_idempotent() {
    let timeline = TestTimeline::new();
    let (throttle, invocations) = recording_throttle(&timeline, 200);

    throttle.call("A");
    throttle.call("B");
    throttle.cancel();
    throttle.cancel();
    timeline.advance_to(400);
    assert_eq!(*invocations.borrow(), vec![(0, "A")]);

    throttle.call("C");
    assert_eq!(*invocations.borrow(), vec![(0, "A"), (400, "C")]);
}

#[test]
fn stable_callback_keeps_identity_for_equal_deps() {
    let mut slot: StableCallback<u32, u32> = StableCallback::new();
    let first = slot.update([Dep::from("quiz-1"), Dep::from(3)], |x| x + 1);
    let second = slot.update([Dep::from("quiz-1"), Dep::from(3)], |x| x + 2);

    assert_eq!(first, second);
    assert_eq!(first.generation(), 0);
    assert_eq!(first.call(1), 3);
}

#[test]
fn stable_callback_changes_identity_when_deps_change() {
    let mut slot: StableCallback<u32, u32> = StableCallback::new();
    let first = slot.update([Dep::from(1)], |x| x);
    let longer = slot.update([Dep::from(1), Dep::from(2)], |x| x * 10);
    let shorter = slot.update([Dep::from(1)], |x| x * 100);

    assert_ne!(first, longer);
    assert_ne!(longer, shorter);
    assert_eq!(shorter.generation(), 2);
}

#[test]
fn retained_old_identity_runs_the_latest_body() {
    let calls = Rc::new(Cell::new(0));
    let mut slot: StableCallback<(), &'static str> = StableCallback::new();
    let old: Callback<(), &'static str> = slot.update([Dep::from(false)], |_| "old");
    let _new = {
        let calls = Rc::clone(&calls);
        slot.update([Dep::from(true)], move |_| {
            calls.set(calls.get() + 1);
            "new"
        })
    };

    assert_eq!(old.call(()), "new");
    assert_eq!(calls.get(), 1);
    assert_eq!(slot.current().map(|current| current.generation()), Some(1));
}

#[test]
fn identity_deps_track_shared_values() {
    let question = Rc::new(String::from("What is 2 + 2?"));
    let mut slot: StableCallback<()> = StableCallback::new();
    let first = slot.update([Dep::identity(&question)], |_| {});
    let same = slot.update([Dep::identity(&question)], |_| {});
    let replaced = Rc::new(String::from("What is 2 + 2?"));
    let changed = slot.update([Dep::identity(&replaced)], |_| {});

    assert!(first.ptr_eq(&same));
    assert!(!first.ptr_eq(&changed));
}
