use glimpse_ui_graphics::Size;
use std::fmt;

/// What to load and how to describe it.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaDescriptor {
    pub src: String,
    pub alt: String,
    /// Intrinsic size, when known, so hosts can reserve layout space.
    pub size: Option<Size>,
}

impl MediaDescriptor {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }
}

/// A single load issued to a [`MediaLoader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRequest {
    pub src: String,
    pub priority: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

/// One-shot handle a loader resolves when the resource settles.
///
/// Dropping the handle without resolving it counts as a failure.
pub struct LoadCompletion {
    resolve: Option<Box<dyn FnOnce(LoadOutcome)>>,
}

impl LoadCompletion {
    pub fn new(resolve: impl FnOnce(LoadOutcome) + 'static) -> Self {
        Self {
            resolve: Some(Box::new(resolve)),
        }
    }

    pub fn succeed(mut self) {
        self.finish(LoadOutcome::Loaded);
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        self.finish(LoadOutcome::Failed(reason.into()));
    }

    fn finish(&mut self, outcome: LoadOutcome) {
        if let Some(resolve) = self.resolve.take() {
            resolve(outcome);
        }
    }
}

impl Drop for LoadCompletion {
    fn drop(&mut self) {
        self.finish(LoadOutcome::Failed("load abandoned".to_string()));
    }
}

impl fmt::Debug for LoadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCompletion")
            .field("pending", &self.resolve.is_some())
            .finish()
    }
}

/// Fetches remote media. Implementations may resolve the completion
/// synchronously or keep it and resolve later.
pub trait MediaLoader {
    fn load(&self, request: MediaRequest, completion: LoadCompletion);
}
