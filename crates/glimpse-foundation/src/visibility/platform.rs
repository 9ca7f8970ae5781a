use super::config::{RootTarget, Threshold};
use super::margin::RootMargin;
use super::observation::{ElementId, ObservationRecord};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Parameters of one measurement subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserveRequest {
    pub target: ElementId,
    pub root: RootTarget,
    pub root_margin: RootMargin,
    pub thresholds: Threshold,
}

pub type ObservationCallback = Box<dyn FnMut(ObservationRecord)>;

/// Host capability that measures element visibility.
///
/// Implementations deliver records in the order they were produced and must
/// not invoke a callback after its subscription was passed to
/// [`VisibilityPlatform::unobserve`], including from inside another callback.
pub trait VisibilityPlatform {
    fn observe(&self, request: ObserveRequest, callback: ObservationCallback) -> SubscriptionId;

    /// Releases a subscription. Unknown ids are ignored.
    fn unobserve(&self, id: SubscriptionId);
}

/// Owned measurement subscription; released on drop.
#[must_use = "dropping an ObserverSubscription releases it"]
pub struct ObserverSubscription {
    platform: Rc<dyn VisibilityPlatform>,
    id: Option<SubscriptionId>,
}

impl ObserverSubscription {
    pub fn new(platform: Rc<dyn VisibilityPlatform>, id: SubscriptionId) -> Self {
        Self {
            platform,
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    pub fn release(mut self) {
        self.unobserve();
    }

    fn unobserve(&mut self) {
        if let Some(id) = self.id.take() {
            log::debug!("releasing visibility subscription {}", id.0);
            self.platform.unobserve(id);
        }
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.unobserve();
    }
}

impl fmt::Debug for ObserverSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSubscription")
            .field("id", &self.id)
            .finish()
    }
}

/// Result of probing the host for a visibility capability, taken once when a
/// tracker is built.
#[derive(Clone)]
pub enum MeasurementCapability {
    /// No measurement is possible; trackers keep their initial state.
    Unavailable,
    Available(Rc<dyn VisibilityPlatform>),
}

impl MeasurementCapability {
    /// Server-rendering hosts (see `GlimpseConfig::server_rendering`) never measure.
    ///
    /// Reads the process configuration at call time; a configuration installed
    /// later does not affect capabilities already detected.
    pub fn detect(platform: Option<Rc<dyn VisibilityPlatform>>) -> Self {
        match platform {
            Some(_) if glimpse_core::config().server_rendering => {
                log::debug!("server rendering: visibility measurement disabled");
                MeasurementCapability::Unavailable
            }
            Some(platform) => MeasurementCapability::Available(platform),
            None => MeasurementCapability::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MeasurementCapability::Available(_))
    }
}

impl fmt::Debug for MeasurementCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementCapability::Unavailable => f.write_str("Unavailable"),
            MeasurementCapability::Available(_) => f.write_str("Available"),
        }
    }
}
