use std::fmt;

/// Lifecycle of one media resource.
///
/// `NotLoaded -> Loading` on materialization, then `Loaded` or `Error`.
/// Unmounting while `Loading` returns to `NotLoaded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MediaLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Error,
}

impl MediaLoadState {
    /// Whether the load finished, successfully or not.
    pub fn is_settled(self) -> bool {
        matches!(self, MediaLoadState::Loaded | MediaLoadState::Error)
    }
}

impl fmt::Display for MediaLoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaLoadState::NotLoaded => "not-loaded",
            MediaLoadState::Loading => "loading",
            MediaLoadState::Loaded => "loaded",
            MediaLoadState::Error => "error",
        };
        f.write_str(label)
    }
}
