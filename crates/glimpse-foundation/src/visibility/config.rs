use super::margin::{MarginParseError, RootMargin};
use super::observation::ElementId;
use glimpse_core::GlimpseConfig;
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// The box an element's visibility is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RootTarget {
    #[default]
    Viewport,
    Element(ElementId),
}

/// Visible fractions at which a measurement is reported.
///
/// Values are kept sorted and deduplicated; an empty list means `[0.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Threshold(SmallVec<[f32; 4]>);

impl Threshold {
    pub fn single(value: f32) -> Self {
        Self(smallvec![value])
    }

    pub fn list(values: impl IntoIterator<Item = f32>) -> Self {
        let mut values: SmallVec<[f32; 4]> = values.into_iter().collect();
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// Whether `ratio` reaches at least one threshold.
    pub fn is_met_by(&self, ratio: f32) -> bool {
        self.0.iter().any(|threshold| ratio >= *threshold)
    }

    /// Number of thresholds at or below `ratio`.
    pub fn crossed(&self, ratio: f32) -> usize {
        self.0.iter().filter(|threshold| ratio >= **threshold).count()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::single(0.0)
    }
}

impl From<f32> for Threshold {
    fn from(value: f32) -> Self {
        Self::single(value)
    }
}

impl From<Vec<f32>> for Threshold {
    fn from(values: Vec<f32>) -> Self {
        Self::list(values)
    }
}

impl From<&[f32]> for Threshold {
    fn from(values: &[f32]) -> Self {
        Self::list(values.iter().copied())
    }
}

/// How a [`VisibilityTracker`](super::VisibilityTracker) measures its element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerConfiguration {
    pub root: RootTarget,
    pub root_margin: RootMargin,
    pub threshold: Threshold,
    /// Keep reporting in-view once the element has been seen.
    pub freeze_once_visible: bool,
    /// State reported before the first measurement, and forever when nothing
    /// is measured.
    pub initial_in_view: bool,
    /// Never attach a measurement subscription.
    pub skip_observer: bool,
    /// Release the subscription after the first positive measurement.
    pub observe_once: bool,
}

impl TrackerConfiguration {
    /// Defaults seeded from the process configuration.
    pub fn from_config(config: &GlimpseConfig) -> Result<Self, MarginParseError> {
        Ok(Self {
            root_margin: RootMargin::parse(&config.default_root_margin)?,
            ..Self::default()
        })
    }

    pub fn with_root(mut self, root: RootTarget) -> Self {
        self.root = root;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn with_threshold(mut self, threshold: impl Into<Threshold>) -> Self {
        self.threshold = threshold.into();
        self
    }

    pub fn with_freeze_once_visible(mut self, freeze: bool) -> Self {
        self.freeze_once_visible = freeze;
        self
    }

    pub fn with_initial_in_view(mut self, in_view: bool) -> Self {
        self.initial_in_view = in_view;
        self
    }

    pub fn with_skip_observer(mut self, skip: bool) -> Self {
        self.skip_observer = skip;
        self
    }

    pub fn with_observe_once(mut self, once: bool) -> Self {
        self.observe_once = once;
        self
    }

    /// Checks the preconditions trackers assume. Trackers never call this
    /// themselves.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for value in self.threshold.values() {
            if !(0.0..=1.0).contains(value) {
                return Err(ConfigurationError::ThresholdOutOfRange { value: *value });
            }
        }
        Ok(())
    }

    /// Whether `other` can keep the subscription attached under `self`. Only
    /// the root, root margin, threshold, `freeze_once_visible` and
    /// `skip_observer` matter.
    pub(crate) fn same_attachment(&self, other: &TrackerConfiguration) -> bool {
        self.root == other.root
            && self.root_margin.is_equivalent(&other.root_margin)
            && self.threshold == other.threshold
            && self.freeze_once_visible == other.freeze_once_visible
            && self.skip_observer == other.skip_observer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    ThresholdOutOfRange { value: f32 },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ThresholdOutOfRange { value } => {
                write!(f, "threshold {value} is outside 0.0..=1.0")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::MarginLength;

    #[test]
    fn threshold_list_is_sorted_and_deduplicated() {
        let threshold = Threshold::list([1.0, 0.25, 0.5, 0.25]);
        assert_eq!(threshold.values(), &[0.25, 0.5, 1.0]);
        assert_eq!(Threshold::list([]).values(), &[0.0]);
    }

    #[test]
    fn threshold_crossings() {
        let threshold = Threshold::list([0.0, 0.5, 1.0]);
        assert_eq!(threshold.crossed(0.0), 1);
        assert_eq!(threshold.crossed(0.6), 2);
        assert_eq!(threshold.crossed(1.0), 3);
        assert!(!Threshold::single(0.5).is_met_by(0.4));
        assert!(Threshold::single(0.5).is_met_by(0.5));
    }

    #[test]
    fn validate_rejects_out_of_range_thresholds() {
        let config = TrackerConfiguration::default().with_threshold(vec![0.5f32, 1.5]);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::ThresholdOutOfRange { value: 1.5 })
        );
        let nan = TrackerConfiguration::default().with_threshold(f32::NAN);
        assert!(nan.validate().is_err());
        assert!(TrackerConfiguration::default().validate().is_ok());
    }

    #[test]
    fn attachment_ignores_initial_state_fields() {
        let base = TrackerConfiguration::default();
        let same = base.clone().with_initial_in_view(true).with_observe_once(true);
        assert!(base.same_attachment(&same));

        let moved = base.clone().with_threshold(0.5f32);
        assert!(!base.same_attachment(&moved));
        let frozen = base.clone().with_freeze_once_visible(true);
        assert!(!base.same_attachment(&frozen));
        let skipped = base.clone().with_skip_observer(true);
        assert!(!base.same_attachment(&skipped));
    }

    #[test]
    fn zero_margin_spellings_keep_the_attachment() {
        let base = TrackerConfiguration::default();
        let bare_zero = base
            .clone()
            .with_root_margin(RootMargin::parse("0px 0").unwrap());
        assert!(base.same_attachment(&bare_zero));

        let grown = base.clone().with_root_margin(RootMargin::parse("1px").unwrap());
        assert!(!base.same_attachment(&grown));
    }

    #[test]
    fn from_config_parses_default_margin() {
        let config = GlimpseConfig {
            default_root_margin: "200px".to_string(),
            ..GlimpseConfig::default()
        };
        let tracker = TrackerConfiguration::from_config(&config).unwrap();
        assert_eq!(tracker.root_margin, RootMargin::uniform(MarginLength::Px(200.0)));
    }
}
