//! Deferred loading of remote media behind a visibility tracker.

mod lazy_media;
mod loader;
mod state;

pub use lazy_media::{LazyMedia, LazyMediaOptions, MediaView};
pub use loader::{LoadCompletion, LoadOutcome, MediaDescriptor, MediaLoader, MediaRequest};
pub use state::MediaLoadState;
