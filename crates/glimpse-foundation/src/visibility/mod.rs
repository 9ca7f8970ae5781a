//! Viewport-driven visibility tracking.
//!
//! A [`VisibilityTracker`] binds to one element and publishes whether it
//! satisfies its threshold relative to a root. Measurements come from a
//! [`VisibilityPlatform`]; hosts without one get a tracker that trusts its
//! configured initial state.

mod config;
mod geometry_platform;
mod margin;
mod observation;
mod platform;
mod tracker;

pub use config::{ConfigurationError, RootTarget, Threshold, TrackerConfiguration};
pub use geometry_platform::GeometryVisibilityPlatform;
pub use margin::{MarginLength, MarginParseError, RootMargin};
pub use observation::{ElementId, ObservationRecord};
pub use platform::{
    MeasurementCapability, ObservationCallback, ObserveRequest, ObserverSubscription,
    SubscriptionId, VisibilityPlatform,
};
pub use tracker::{ElementBinding, VisibilityTracker};
