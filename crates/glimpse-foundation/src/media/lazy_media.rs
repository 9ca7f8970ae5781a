use super::loader::{LoadCompletion, LoadOutcome, MediaDescriptor, MediaLoader, MediaRequest};
use super::state::MediaLoadState;
use crate::visibility::{ElementId, TrackerConfiguration, VisibilityPlatform, VisibilityTracker};
use glimpse_core::{Owned, WatchRegistration, WeakOwned};
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
pub struct LazyMediaOptions {
    /// Load on mount without waiting for visibility.
    pub priority: bool,
    pub tracker: TrackerConfiguration,
    pub on_load: Option<Box<dyn FnOnce()>>,
}

impl LazyMediaOptions {
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tracker(mut self, tracker: TrackerConfiguration) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_on_load(mut self, on_load: impl FnOnce() + 'static) -> Self {
        self.on_load = Some(Box::new(on_load));
        self
    }
}

impl fmt::Debug for LazyMediaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMediaOptions")
            .field("priority", &self.priority)
            .field("tracker", &self.tracker)
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

/// What a host should draw for a [`LazyMedia`] right now.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaView {
    /// Neutral stand-in shown until the media has loaded or failed.
    pub placeholder: bool,
    /// The materialized media element, once a request was issued.
    pub media: Option<MediaDescriptor>,
    /// Failure reason for the error indicator.
    pub error: Option<String>,
}

struct MediaSlot {
    state: MediaLoadState,
    error: Option<String>,
    mounted: bool,
    // Bumped on every mount and unmount; completions carry the value they
    // were issued under.
    mount_generation: u64,
    requests: usize,
    on_load: Option<Box<dyn FnOnce()>>,
}

/// Remote media that is only requested once it is (about to be) visible.
pub struct LazyMedia {
    descriptor: MediaDescriptor,
    priority: bool,
    slot: Owned<MediaSlot>,
    tracker: VisibilityTracker,
    loader: Rc<dyn MediaLoader>,
    watch: Option<WatchRegistration>,
}

impl LazyMedia {
    pub fn new(
        descriptor: MediaDescriptor,
        options: LazyMediaOptions,
        platform: Option<Rc<dyn VisibilityPlatform>>,
        loader: Rc<dyn MediaLoader>,
    ) -> Self {
        let LazyMediaOptions {
            priority,
            tracker,
            on_load,
        } = options;
        let tracker = if priority {
            tracker.with_skip_observer(true).with_initial_in_view(true)
        } else {
            tracker
        };
        Self {
            descriptor,
            priority,
            slot: Owned::new(MediaSlot {
                state: MediaLoadState::NotLoaded,
                error: None,
                mounted: false,
                mount_generation: 0,
                requests: 0,
                on_load,
            }),
            tracker: VisibilityTracker::new(tracker, platform),
            loader,
            watch: None,
        }
    }

    /// Attaches to the rendered element. The resource is requested as soon as
    /// the tracker reports it in view, which for priority media is immediately.
    pub fn mount(&mut self, element: ElementId) {
        if self.tracker.element() == Some(element) && self.watch.is_some() {
            return;
        }
        if self.watch.is_some() {
            self.unmount();
        }
        self.slot.update(|slot| {
            slot.mounted = true;
            slot.mount_generation += 1;
        });

        let slot = self.slot.downgrade();
        let loader = Rc::clone(&self.loader);
        let request = self.request();
        self.watch = Some(self.tracker.in_view_signal().watch(move |visible| {
            if !*visible {
                return;
            }
            if let Some(slot) = slot.upgrade() {
                materialize(&slot, &loader, request.clone());
            }
        }));
        self.tracker.bind(element);
        if self.tracker.in_view() {
            materialize(&self.slot, &self.loader, self.request());
        }
    }

    /// Detaches from the element. A load still in flight is forgotten and
    /// will be requested again on the next mount.
    pub fn unmount(&mut self) {
        self.watch = None;
        self.tracker.unbind();
        self.slot.update(|slot| {
            slot.mounted = false;
            slot.mount_generation += 1;
            if slot.state == MediaLoadState::Loading {
                slot.state = MediaLoadState::NotLoaded;
            }
        });
    }

    pub fn render(&self) -> MediaView {
        self.slot.with(|slot| {
            let media = match slot.state {
                MediaLoadState::Loading | MediaLoadState::Loaded => Some(self.descriptor.clone()),
                MediaLoadState::NotLoaded | MediaLoadState::Error => None,
            };
            MediaView {
                placeholder: !self.priority && !slot.state.is_settled(),
                media,
                error: slot.error.clone(),
            }
        })
    }

    pub fn state(&self) -> MediaLoadState {
        self.slot.with(|slot| slot.state)
    }

    pub fn error_reason(&self) -> Option<String> {
        self.slot.with(|slot| slot.error.clone())
    }

    /// Number of loads issued to the loader so far.
    pub fn request_count(&self) -> usize {
        self.slot.with(|slot| slot.requests)
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.with(|slot| slot.mounted)
    }

    pub fn is_priority(&self) -> bool {
        self.priority
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    pub fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    fn request(&self) -> MediaRequest {
        MediaRequest {
            src: self.descriptor.src.clone(),
            priority: self.priority,
        }
    }
}

fn materialize(slot: &Owned<MediaSlot>, loader: &Rc<dyn MediaLoader>, request: MediaRequest) {
    let generation = slot.update(|slot| {
        if !slot.mounted || slot.state != MediaLoadState::NotLoaded {
            return None;
        }
        slot.state = MediaLoadState::Loading;
        slot.requests += 1;
        Some(slot.mount_generation)
    });
    let Some(generation) = generation else {
        return;
    };

    log::debug!("requesting {} (priority={})", request.src, request.priority);
    let weak = slot.downgrade();
    let src = request.src.clone();
    let completion = LoadCompletion::new(move |outcome| complete(&weak, generation, &src, outcome));
    loader.load(request, completion);
}

fn complete(slot: &WeakOwned<MediaSlot>, generation: u64, src: &str, outcome: LoadOutcome) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let on_load = slot.update(|slot| {
        if slot.mount_generation != generation || slot.state != MediaLoadState::Loading {
            log::trace!("ignoring completion for {src} from an earlier mount");
            return None;
        }
        match outcome {
            LoadOutcome::Loaded => {
                slot.state = MediaLoadState::Loaded;
                slot.on_load.take()
            }
            LoadOutcome::Failed(reason) => {
                log::warn!("failed to load {src}: {reason}");
                slot.state = MediaLoadState::Error;
                slot.error = Some(reason);
                None
            }
        }
    });
    if let Some(on_load) = on_load {
        on_load();
    }
}
