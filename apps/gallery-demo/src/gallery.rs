use glimpse_core::GlimpseConfig;
use glimpse_foundation::{
    ElementId, GeometryVisibilityPlatform, LazyMedia, LazyMediaOptions, MediaDescriptor,
    MediaLoadState, MediaLoader, Threshold, TrackerConfiguration, VisibilityPlatform,
};
use glimpse_ui_graphics::{Rect, Size};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub const VIEWPORT: Rect = Rect::new(0.0, 0.0, 390.0, 844.0);
const CARD_HEIGHT: f32 = 280.0;
const CARD_GAP: f32 = 24.0;

/// Vertical list of quiz question cards, each with one lazily loaded image.
pub struct Gallery {
    platform: Rc<GeometryVisibilityPlatform>,
    cards: Vec<LazyMedia>,
    loaded: Rc<Cell<usize>>,
    content_height: f32,
}

impl Gallery {
    pub fn build(
        config: &GlimpseConfig,
        platform: Rc<GeometryVisibilityPlatform>,
        loader: Rc<dyn MediaLoader>,
        count: usize,
    ) -> anyhow::Result<Self> {
        let tracker = TrackerConfiguration::from_config(config)?
            .with_threshold(Threshold::single(0.1))
            .with_freeze_once_visible(true)
            .with_observe_once(true);
        tracker.validate()?;

        // Server rendering is detected by the trackers themselves.
        let capability: Rc<dyn VisibilityPlatform> = platform.clone();
        let loaded = Rc::new(Cell::new(0));
        let mut cards = Vec::with_capacity(count);
        for index in 0..count {
            let element = ElementId(index as u64);
            let top = index as f32 * (CARD_HEIGHT + CARD_GAP);
            platform.set_element_rect(element, Rect::new(0.0, top, VIEWPORT.width, CARD_HEIGHT));

            let options = {
                let loaded = Rc::clone(&loaded);
                LazyMediaOptions::default()
                    .with_priority(index == 0)
                    .with_tracker(tracker.clone())
                    .with_on_load(move || {
                        loaded.set(loaded.get() + 1);
                        log::info!("question {index} image ready");
                    })
            };
            let mut media = LazyMedia::new(
                describe(index),
                options,
                Some(Rc::clone(&capability)),
                Rc::clone(&loader),
            );
            media.mount(element);
            cards.push(media);
        }

        let content_height = count as f32 * (CARD_HEIGHT + CARD_GAP);
        Ok(Self {
            platform,
            cards,
            loaded,
            content_height,
        })
    }

    pub fn max_scroll(&self) -> f32 {
        (self.content_height - VIEWPORT.height).max(0.0)
    }

    /// Moves the viewport and measures; returns the number of delivered records.
    pub fn scroll_to(&self, offset: f32) -> usize {
        self.platform.scroll_to(0.0, offset.clamp(0.0, self.max_scroll()));
        self.platform.measure()
    }

    pub fn loaded(&self) -> usize {
        self.loaded.get()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for card in &self.cards {
            match card.state() {
                MediaLoadState::NotLoaded => summary.not_loaded += 1,
                MediaLoadState::Loading => summary.loading += 1,
                MediaLoadState::Loaded => summary.loaded += 1,
                MediaLoadState::Error => summary.failed += 1,
            }
            summary.requests += card.request_count();
            summary.placeholders += usize::from(card.render().placeholder);
        }
        summary
    }

    pub fn cards(&self) -> &[LazyMedia] {
        &self.cards
    }
}

fn describe(index: usize) -> MediaDescriptor {
    let src = if index % 7 == 5 {
        format!("https://cdn.example.com/quiz/missing-{index}.png")
    } else {
        format!("https://cdn.example.com/quiz/question-{index}.png")
    };
    MediaDescriptor::new(src, format!("Diagram for question {}", index + 1))
        .with_size(Size::new(VIEWPORT.width, CARD_HEIGHT))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub loaded: usize,
    pub loading: usize,
    pub failed: usize,
    pub not_loaded: usize,
    pub requests: usize,
    pub placeholders: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loaded, {} loading, {} failed, {} deferred ({} requests, {} placeholders)",
            self.loaded, self.loading, self.failed, self.not_loaded, self.requests, self.placeholders
        )
    }
}
