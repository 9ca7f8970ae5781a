//! Testing utilities and harness for Glimpse

pub mod recording;
pub mod timeline;

pub use recording::*;
pub use timeline::*;

pub mod prelude {
    pub use crate::recording::*;
    pub use crate::timeline::*;
}
