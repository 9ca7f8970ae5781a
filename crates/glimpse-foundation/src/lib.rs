//! Foundation elements for Glimpse: visibility tracking and lazy media

pub mod media;
pub mod visibility;

pub use media::{
    LazyMedia, LazyMediaOptions, LoadCompletion, LoadOutcome, MediaDescriptor, MediaLoadState,
    MediaLoader, MediaRequest, MediaView,
};
pub use visibility::{
    ConfigurationError, ElementBinding, ElementId, GeometryVisibilityPlatform, MarginLength,
    MarginParseError, MeasurementCapability, ObservationCallback, ObservationRecord,
    ObserveRequest, ObserverSubscription, RootMargin, RootTarget, SubscriptionId, Threshold,
    TrackerConfiguration, VisibilityPlatform, VisibilityTracker,
};

pub mod prelude {
    pub use crate::media::{LazyMedia, LazyMediaOptions, MediaDescriptor, MediaLoadState};
    pub use crate::visibility::{
        ElementId, RootMargin, RootTarget, Threshold, TrackerConfiguration, VisibilityTracker,
    };
}
