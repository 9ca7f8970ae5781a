use super::config::TrackerConfiguration;
use super::observation::{ElementId, ObservationRecord};
use super::platform::{MeasurementCapability, ObserveRequest, ObserverSubscription, VisibilityPlatform};
use glimpse_core::{Owned, Signal, WeakOwned};
use std::rc::Rc;

struct TrackerState {
    config: TrackerConfiguration,
    element: Option<ElementId>,
    frozen: bool,
    // Attachment currently accepting measurements. Set before the platform is
    // asked to observe so that a synchronous first delivery is not lost.
    observing: Option<u64>,
    subscription: Option<ObserverSubscription>,
    generation: u64,
}

enum Measured {
    Stale,
    Applied {
        in_view: bool,
        released: Option<ObserverSubscription>,
    },
}

/// Tracks whether one bound element satisfies its visibility threshold.
///
/// Clones share the same state. The measurement subscription is owned by that
/// state and released when the element is unbound, when the configuration
/// changes, after the first positive measurement with `observe_once`, or when
/// the last clone is dropped.
#[derive(Clone)]
pub struct VisibilityTracker {
    capability: MeasurementCapability,
    state: Owned<TrackerState>,
    in_view: Signal<bool>,
    latest: Signal<Option<ObservationRecord>>,
}

impl VisibilityTracker {
    /// Detects the measurement capability from `platform` and the process
    /// configuration as installed right now (`glimpse_core::install_config`).
    pub fn new(
        config: TrackerConfiguration,
        platform: Option<Rc<dyn VisibilityPlatform>>,
    ) -> Self {
        let capability = MeasurementCapability::detect(platform);
        if !capability.is_available() {
            log::debug!(
                "no visibility capability; tracker reports initial_in_view={}",
                config.initial_in_view
            );
        }
        let in_view = Signal::new(config.initial_in_view);
        Self {
            capability,
            state: Owned::new(TrackerState {
                config,
                element: None,
                frozen: false,
                observing: None,
                subscription: None,
                generation: 0,
            }),
            in_view,
            latest: Signal::new(None),
        }
    }

    /// Builds a tracker and splits it into the handle to bind and the two
    /// signals consumers read. The tracker lives as long as the binding.
    pub fn create(
        config: TrackerConfiguration,
        platform: Option<Rc<dyn VisibilityPlatform>>,
    ) -> (
        ElementBinding,
        Signal<bool>,
        Signal<Option<ObservationRecord>>,
    ) {
        let tracker = Self::new(config, platform);
        let in_view = tracker.in_view_signal();
        let latest = tracker.latest_signal();
        (ElementBinding { tracker }, in_view, latest)
    }

    /// Attaches to `element` (mount). Rebinding to another element releases the
    /// previous subscription first.
    pub fn bind(&self, element: ElementId) {
        let previous = self.state.with(|state| state.element);
        if previous == Some(element) {
            return;
        }
        self.release();
        self.state.update(|state| state.element = Some(element));
        self.attach();
    }

    /// Detaches from the current element (unmount). The last published state is kept.
    pub fn unbind(&self) {
        self.release();
        self.state.update(|state| state.element = None);
    }

    /// Replaces the configuration. A change to the root, root margin,
    /// threshold, `freeze_once_visible` or `skip_observer` re-subscribes, unless
    /// the tracker is already frozen in view.
    pub fn reconfigure(&self, config: TrackerConfiguration) {
        let (changed, skip_enabled, initial, frozen) = self.state.update(|state| {
            let changed = !state.config.same_attachment(&config);
            let skip_enabled = config.skip_observer && !state.config.skip_observer;
            let initial = config.initial_in_view;
            state.config = config;
            (changed, skip_enabled, initial, state.frozen)
        });
        if !changed {
            return;
        }
        self.release();
        if skip_enabled && !frozen {
            self.in_view.set(initial);
        }
        self.attach();
    }

    pub fn in_view(&self) -> bool {
        self.in_view.get()
    }

    pub fn in_view_signal(&self) -> Signal<bool> {
        self.in_view.clone()
    }

    pub fn latest_observation(&self) -> Option<ObservationRecord> {
        self.latest.get()
    }

    pub fn latest_signal(&self) -> Signal<Option<ObservationRecord>> {
        self.latest.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.state.with(|state| state.frozen)
    }

    /// Whether a measurement subscription is currently held.
    pub fn is_observing(&self) -> bool {
        self.state.with(|state| state.subscription.is_some())
    }

    pub fn element(&self) -> Option<ElementId> {
        self.state.with(|state| state.element)
    }

    pub fn config(&self) -> TrackerConfiguration {
        self.state.with(|state| state.config.clone())
    }

    pub fn capability(&self) -> &MeasurementCapability {
        &self.capability
    }

    fn attach(&self) {
        let MeasurementCapability::Available(platform) = &self.capability else {
            return;
        };
        let prepared = self.state.update(|state| {
            if state.config.skip_observer
                || state.frozen
                || state.subscription.is_some()
                || state.observing.is_some()
            {
                return None;
            }
            let target = state.element?;
            state.generation += 1;
            state.observing = Some(state.generation);
            Some((
                state.generation,
                ObserveRequest {
                    target,
                    root: state.config.root,
                    root_margin: state.config.root_margin,
                    thresholds: state.config.threshold.clone(),
                },
            ))
        });
        let Some((generation, request)) = prepared else {
            return;
        };

        log::debug!(
            "observing {} (root {:?}, margin {}, attachment {generation})",
            request.target,
            request.root,
            request.root_margin
        );
        let weak = self.state.downgrade();
        let in_view = self.in_view.clone();
        let latest = self.latest.clone();
        let id = platform.observe(
            request,
            Box::new(move |record| apply_measurement(&weak, generation, &in_view, &latest, record)),
        );
        let subscription = ObserverSubscription::new(Rc::clone(platform), id);
        let orphan = self.state.update(|state| {
            if state.observing == Some(generation) {
                state.subscription = Some(subscription);
                None
            } else {
                // Released while the platform was still inside `observe`.
                Some(subscription)
            }
        });
        drop(orphan);
    }

    fn release(&self) {
        let subscription = self.state.update(|state| {
            state.observing = None;
            state.subscription.take()
        });
        drop(subscription);
    }
}

fn apply_measurement(
    state: &WeakOwned<TrackerState>,
    generation: u64,
    in_view: &Signal<bool>,
    latest: &Signal<Option<ObservationRecord>>,
    record: ObservationRecord,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let measured = state.update(|state| {
        if state.observing != Some(generation) {
            return Measured::Stale;
        }
        let meets = record.is_intersecting
            && state.config.threshold.is_met_by(record.intersection_ratio);
        if meets && state.config.freeze_once_visible {
            state.frozen = true;
        }
        let released = if meets && state.config.observe_once {
            state.observing = None;
            state.subscription.take()
        } else {
            None
        };
        if glimpse_core::config().debug_visibility {
            log::trace!(
                "{}: intersecting={} ratio={:.3} frozen={}",
                record.target,
                record.is_intersecting,
                record.intersection_ratio,
                state.frozen
            );
        }
        Measured::Applied {
            in_view: meets || state.frozen,
            released,
        }
    });

    match measured {
        Measured::Stale => {
            log::trace!("dropping measurement from released attachment {generation}");
        }
        Measured::Applied { in_view: visible, released } => {
            drop(released);
            latest.set(Some(record));
            in_view.set(visible);
        }
    }
}

/// The handle a host attaches to the element it renders.
///
/// Dropping the binding drops the tracker (unless it was cloned elsewhere) and
/// with it any active subscription.
pub struct ElementBinding {
    tracker: VisibilityTracker,
}

impl ElementBinding {
    pub fn bind(&self, element: ElementId) {
        self.tracker.bind(element);
    }

    pub fn unbind(&self) {
        self.tracker.unbind();
    }

    pub fn element(&self) -> Option<ElementId> {
        self.tracker.element()
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::SubscriptionId;
    use crate::visibility::{ObservationCallback, Threshold};
    use glimpse_ui_graphics::Rect;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct SyncPlatform {
        next: Cell<u64>,
        active: RefCell<Vec<u64>>,
        ratio_on_observe: Cell<Option<f32>>,
    }

    impl VisibilityPlatform for SyncPlatform {
        fn observe(&self, request: ObserveRequest, mut callback: ObservationCallback) -> SubscriptionId {
            let id = self.next.get() + 1;
            self.next.set(id);
            self.active.borrow_mut().push(id);
            if let Some(ratio) = self.ratio_on_observe.get() {
                callback(ObservationRecord {
                    target: request.target,
                    is_intersecting: ratio > 0.0,
                    intersection_ratio: ratio,
                    bounding_rect: Rect::ZERO,
                    intersection_rect: Rect::ZERO,
                    root_bounds: None,
                    time_millis: 0,
                });
            }
            SubscriptionId(id)
        }

        fn unobserve(&self, id: SubscriptionId) {
            self.active.borrow_mut().retain(|entry| *entry != id.0);
        }
    }

    #[test]
    fn synchronous_first_delivery_is_applied() {
        let platform = Rc::new(SyncPlatform::default());
        platform.ratio_on_observe.set(Some(1.0));
        let tracker = VisibilityTracker::new(TrackerConfiguration::default(), Some(platform.clone()));
        tracker.bind(ElementId(1));
        assert!(tracker.in_view());
        assert!(tracker.is_observing());
        assert_eq!(platform.active.borrow().len(), 1);
    }

    #[test]
    fn synchronous_observe_once_releases_immediately() {
        let platform = Rc::new(SyncPlatform::default());
        platform.ratio_on_observe.set(Some(0.5));
        let config = TrackerConfiguration::default()
            .with_observe_once(true)
            .with_freeze_once_visible(true);
        let tracker = VisibilityTracker::new(config, Some(platform.clone()));
        tracker.bind(ElementId(1));
        assert!(tracker.in_view());
        assert!(tracker.is_frozen());
        assert!(!tracker.is_observing());
        assert!(platform.active.borrow().is_empty());
    }

    #[test]
    fn ratio_below_threshold_is_not_in_view() {
        let platform = Rc::new(SyncPlatform::default());
        platform.ratio_on_observe.set(Some(0.25));
        let config = TrackerConfiguration::default().with_threshold(Threshold::single(0.5));
        let tracker = VisibilityTracker::new(config, Some(platform.clone()));
        tracker.bind(ElementId(1));
        assert!(!tracker.in_view());
        assert_eq!(
            tracker.latest_observation().map(|record| record.intersection_ratio),
            Some(0.25)
        );
    }

    #[test]
    fn missing_capability_keeps_initial_state() {
        let tracker =
            VisibilityTracker::new(TrackerConfiguration::default().with_initial_in_view(true), None);
        tracker.bind(ElementId(3));
        assert!(tracker.in_view());
        assert!(!tracker.is_observing());
        assert!(!tracker.capability().is_available());
    }
}
