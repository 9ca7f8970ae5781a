//! Scriptable stand-ins for the host capabilities.

use glimpse_foundation::{
    ElementId, LoadCompletion, MediaLoader, MediaRequest, ObservationCallback, ObservationRecord,
    ObserveRequest, SubscriptionId, VisibilityPlatform,
};
use glimpse_ui_graphics::Rect;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct RecordedSubscription {
    request: ObserveRequest,
    callback: Rc<RefCell<ObservationCallback>>,
}

/// Visibility platform whose measurements are pushed by the test.
#[derive(Default)]
pub struct RecordingVisibilityPlatform {
    next_id: Cell<u64>,
    active: RefCell<IndexMap<SubscriptionId, RecordedSubscription>>,
    requests: RefCell<Vec<ObserveRequest>>,
    unobserve_calls: Cell<usize>,
}

impl RecordingVisibilityPlatform {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Subscriptions currently registered.
    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn is_observing(&self, target: ElementId) -> bool {
        self.active
            .borrow()
            .values()
            .any(|subscription| subscription.request.target == target)
    }

    pub fn observe_calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn unobserve_calls(&self) -> usize {
        self.unobserve_calls.get()
    }

    /// Every request ever made, in order.
    pub fn requests(&self) -> Vec<ObserveRequest> {
        self.requests.borrow().clone()
    }

    /// Delivers `record` to every active subscription on `target`. Returns
    /// the number of callbacks invoked.
    pub fn emit(&self, target: ElementId, record: ObservationRecord) -> usize {
        let callbacks: Vec<(SubscriptionId, Rc<RefCell<ObservationCallback>>)> = self
            .active
            .borrow()
            .iter()
            .filter(|(_, subscription)| subscription.request.target == target)
            .map(|(id, subscription)| (*id, Rc::clone(&subscription.callback)))
            .collect();
        let mut delivered = 0;
        for (id, callback) in callbacks {
            if !self.active.borrow().contains_key(&id) {
                continue;
            }
            let mut callback = callback.borrow_mut();
            (&mut *callback)(record.clone());
            delivered += 1;
        }
        delivered
    }

    pub fn emit_visible(&self, target: ElementId, ratio: f32) -> usize {
        self.emit(target, ObservationBuilder::new(target).ratio(ratio).build())
    }

    pub fn emit_hidden(&self, target: ElementId) -> usize {
        self.emit(target, ObservationBuilder::new(target).build())
    }

    /// Hands out the callback of a subscription so a test can invoke it after
    /// the subscription was released.
    pub fn callback_for(&self, id: SubscriptionId) -> Option<Rc<RefCell<ObservationCallback>>> {
        self.active
            .borrow()
            .get(&id)
            .map(|subscription| Rc::clone(&subscription.callback))
    }

    pub fn active_ids(&self) -> Vec<SubscriptionId> {
        self.active.borrow().keys().copied().collect()
    }
}

impl VisibilityPlatform for RecordingVisibilityPlatform {
    fn observe(&self, request: ObserveRequest, callback: ObservationCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.requests.borrow_mut().push(request.clone());
        self.active.borrow_mut().insert(
            id,
            RecordedSubscription {
                request,
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        id
    }

    fn unobserve(&self, id: SubscriptionId) {
        self.unobserve_calls.set(self.unobserve_calls.get() + 1);
        self.active.borrow_mut().shift_remove(&id);
    }
}

/// Media loader that parks every request until the test resolves it.
#[derive(Default)]
pub struct RecordingMediaLoader {
    requests: RefCell<Vec<MediaRequest>>,
    completions: RefCell<Vec<Option<LoadCompletion>>>,
}

impl RecordingMediaLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<MediaRequest> {
        self.requests.borrow().clone()
    }

    /// Requests not yet resolved.
    pub fn pending_count(&self) -> usize {
        self.completions
            .borrow()
            .iter()
            .filter(|completion| completion.is_some())
            .count()
    }

    /// Resolves request `index` successfully. Returns `false` if it was
    /// already resolved or never issued.
    pub fn succeed(&self, index: usize) -> bool {
        match self.take(index) {
            Some(completion) => {
                completion.succeed();
                true
            }
            None => false,
        }
    }

    pub fn fail(&self, index: usize, reason: &str) -> bool {
        match self.take(index) {
            Some(completion) => {
                completion.fail(reason);
                true
            }
            None => false,
        }
    }

    fn take(&self, index: usize) -> Option<LoadCompletion> {
        self.completions
            .borrow_mut()
            .get_mut(index)
            .and_then(Option::take)
    }
}

impl MediaLoader for RecordingMediaLoader {
    fn load(&self, request: MediaRequest, completion: LoadCompletion) {
        self.requests.borrow_mut().push(request);
        self.completions.borrow_mut().push(Some(completion));
    }
}

/// Builds [`ObservationRecord`]s with sensible defaults.
pub struct ObservationBuilder {
    record: ObservationRecord,
}

impl ObservationBuilder {
    /// A non-intersecting record for `target` at time zero.
    pub fn new(target: ElementId) -> Self {
        Self {
            record: ObservationRecord {
                target,
                is_intersecting: false,
                intersection_ratio: 0.0,
                bounding_rect: Rect::ZERO,
                intersection_rect: Rect::ZERO,
                root_bounds: None,
                time_millis: 0,
            },
        }
    }

    /// Sets the visible fraction; any positive ratio counts as intersecting.
    pub fn ratio(mut self, ratio: f32) -> Self {
        self.record.intersection_ratio = ratio;
        self.record.is_intersecting = ratio > 0.0;
        self
    }

    pub fn intersecting(mut self, intersecting: bool) -> Self {
        self.record.is_intersecting = intersecting;
        self
    }

    pub fn bounding_rect(mut self, rect: Rect) -> Self {
        self.record.bounding_rect = rect;
        self
    }

    pub fn root_bounds(mut self, rect: Rect) -> Self {
        self.record.root_bounds = Some(rect);
        self
    }

    pub fn at(mut self, time_millis: u64) -> Self {
        self.record.time_millis = time_millis;
        self
    }

    pub fn build(self) -> ObservationRecord {
        self.record
    }
}
