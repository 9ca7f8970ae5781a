//! Pure geometry for Glimpse
//!
//! Rectangles, sizes and edge insets shared by the visibility platform and
//! anything that reports element bounds to it.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{EdgeInsets, Rect, Size};
}
