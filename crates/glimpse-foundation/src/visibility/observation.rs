use glimpse_ui_graphics::Rect;
use std::fmt;

/// Identifier of a surface element known to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One visibility measurement of a target element.
///
/// Records are produced by the platform and replaced wholesale on every
/// measurement; nothing edits a record once it has been delivered.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationRecord {
    pub target: ElementId,
    /// The target overlaps (or touches) the root bounds.
    pub is_intersecting: bool,
    /// Visible fraction of the target's area, in `0.0..=1.0`.
    pub intersection_ratio: f32,
    pub bounding_rect: Rect,
    pub intersection_rect: Rect,
    /// Root bounds after the root margin was applied; `None` when the root
    /// could not be measured.
    pub root_bounds: Option<Rect>,
    pub time_millis: u64,
}

impl ObservationRecord {
    /// A record stating that `target` is fully outside its root.
    pub fn outside(target: ElementId, bounding_rect: Rect, root_bounds: Option<Rect>, time_millis: u64) -> Self {
        Self {
            target,
            is_intersecting: false,
            intersection_ratio: 0.0,
            bounding_rect,
            intersection_rect: Rect::ZERO,
            root_bounds,
            time_millis,
        }
    }
}
