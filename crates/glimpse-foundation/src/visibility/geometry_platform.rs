//! Visibility measurement computed from element rectangles.
//!
//! Hosts without a native observer (headless shells, the demo, tests) report
//! the viewport and element bounds here and call
//! [`GeometryVisibilityPlatform::measure`] after layout or scrolling.

use super::config::RootTarget;
use super::observation::{ElementId, ObservationRecord};
use super::platform::{ObservationCallback, ObserveRequest, SubscriptionId, VisibilityPlatform};
use glimpse_core::Clock;
use glimpse_ui_graphics::Rect;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct GeometrySubscription {
    request: ObserveRequest,
    callback: Rc<RefCell<ObservationCallback>>,
    // (crossed threshold count, intersecting) of the last delivered record.
    last_reported: Option<(usize, bool)>,
}

pub struct GeometryVisibilityPlatform {
    clock: Rc<dyn Clock>,
    viewport: Cell<Rect>,
    elements: RefCell<FxHashMap<ElementId, Rect>>,
    subscriptions: RefCell<IndexMap<SubscriptionId, GeometrySubscription>>,
    next_id: Cell<u64>,
}

impl GeometryVisibilityPlatform {
    pub fn new(clock: Rc<dyn Clock>, viewport: Rect) -> Self {
        Self {
            clock,
            viewport: Cell::new(viewport),
            elements: RefCell::new(FxHashMap::default()),
            subscriptions: RefCell::new(IndexMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.viewport.set(viewport);
    }

    /// Moves the viewport origin, keeping its size.
    pub fn scroll_to(&self, x: f32, y: f32) {
        let viewport = self.viewport.get();
        self.viewport
            .set(Rect::new(x, y, viewport.width, viewport.height));
    }

    pub fn set_element_rect(&self, element: ElementId, rect: Rect) {
        if rect.width < 0.0 || rect.height < 0.0 {
            log::warn!("{element} reported negative size {rect:?}");
        }
        self.elements.borrow_mut().insert(element, rect);
    }

    pub fn remove_element(&self, element: ElementId) {
        self.elements.borrow_mut().remove(&element);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Measures every subscription and delivers records whose crossed
    /// threshold or intersecting state changed since the last delivery (the
    /// first measurement is always delivered). Returns the number of
    /// callbacks invoked.
    ///
    /// Targets without a known rectangle are skipped.
    pub fn measure(&self) -> usize {
        let now = self.clock.now_millis();
        let pending: Vec<(SubscriptionId, (usize, bool), ObservationRecord)> = {
            let elements = self.elements.borrow();
            let viewport = self.viewport.get();
            self.subscriptions
                .borrow()
                .iter()
                .filter_map(|(id, subscription)| {
                    let record = compute_record(&subscription.request, &elements, viewport, now)?;
                    let crossed = if record.is_intersecting {
                        subscription.request.thresholds.crossed(record.intersection_ratio)
                    } else {
                        0
                    };
                    let current = (crossed, record.is_intersecting);
                    if subscription.last_reported == Some(current) {
                        return None;
                    }
                    Some((*id, current, record))
                })
                .collect()
        };

        let mut delivered = 0;
        for (id, current, record) in pending {
            // The state is only remembered once the record reaches the
            // callback, so a skipped delivery is retried by the next measure.
            let callback = {
                let mut subscriptions = self.subscriptions.borrow_mut();
                let Some(subscription) = subscriptions.get_mut(&id) else {
                    continue;
                };
                let callback = Rc::clone(&subscription.callback);
                if callback.try_borrow_mut().is_err() {
                    log::warn!("visibility callback {} re-entered measure()", id.0);
                    continue;
                }
                subscription.last_reported = Some(current);
                callback
            };
            let mut callback = callback.borrow_mut();
            (&mut *callback)(record);
            delivered += 1;
        }
        delivered
    }
}

fn compute_record(
    request: &ObserveRequest,
    elements: &FxHashMap<ElementId, Rect>,
    viewport: Rect,
    now: u64,
) -> Option<ObservationRecord> {
    let target = *elements.get(&request.target)?;
    let root = match request.root {
        RootTarget::Viewport => Some(viewport),
        RootTarget::Element(root) => elements.get(&root).copied(),
    };
    let Some(root) = root else {
        return Some(ObservationRecord::outside(request.target, target, None, now));
    };
    let root_bounds = root.outset(request.root_margin.resolve(root));
    let Some(intersection) = target.intersect(&root_bounds) else {
        return Some(ObservationRecord::outside(
            request.target,
            target,
            Some(root_bounds),
            now,
        ));
    };
    let target_area = target.area();
    let ratio = if target_area > 0.0 {
        (intersection.area() / target_area).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(ObservationRecord {
        target: request.target,
        is_intersecting: true,
        intersection_ratio: ratio,
        bounding_rect: target,
        intersection_rect: intersection,
        root_bounds: Some(root_bounds),
        time_millis: now,
    })
}

impl VisibilityPlatform for GeometryVisibilityPlatform {
    fn observe(&self, request: ObserveRequest, callback: ObservationCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().insert(
            id,
            GeometrySubscription {
                request,
                callback: Rc::new(RefCell::new(callback)),
                last_reported: None,
            },
        );
        id
    }

    fn unobserve(&self, id: SubscriptionId) {
        self.subscriptions.borrow_mut().shift_remove(&id);
    }
}
