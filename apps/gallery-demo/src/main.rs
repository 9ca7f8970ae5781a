mod gallery;
mod loader;

use gallery::{Gallery, VIEWPORT};
use glimpse_core::{
    install_config, Dep, GlimpseConfig, StableCallback, SystemClock, Throttle, TimerQueue,
};
use glimpse_foundation::{GeometryVisibilityPlatform, MediaLoader};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const QUESTION_COUNT: usize = 24;
const FRAME: Duration = Duration::from_millis(16);
const SCROLL_SPEED: f32 = 90.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = GlimpseConfig::from_env()?;
    if install_config(config.clone()).is_err() {
        anyhow::bail!("glimpse configuration was installed twice");
    }
    println!("=== Glimpse Gallery Demo ===");
    println!(
        "{QUESTION_COUNT} quiz questions, scroll throttle {:?}, root margin {:?}{}",
        config.scroll_throttle,
        config.default_root_margin,
        if config.server_rendering {
            ", server rendering (no visibility measurement)"
        } else {
            ""
        }
    );
    println!();

    let clock = Rc::new(SystemClock::new());
    let timers = TimerQueue::new(clock.clone());
    let platform = Rc::new(GeometryVisibilityPlatform::new(clock, VIEWPORT));
    let loader: Rc<dyn MediaLoader> = media_loader(&timers)?;
    let gallery = Rc::new(Gallery::build(
        &config,
        Rc::clone(&platform),
        loader,
        QUESTION_COUNT,
    )?);
    gallery.scroll_to(0.0);

    let measured_offsets = Rc::new(Cell::new(0usize));
    let mut on_scroll: StableCallback<f32> = StableCallback::new();
    let mut handler = on_scroll.update(
        [Dep::from(QUESTION_COUNT)],
        scroll_handler(&gallery, &measured_offsets),
    );
    let throttle = {
        let handler = handler.clone();
        Throttle::new(timers.clone(), config.scroll_throttle, move |offset| {
            handler.call(offset)
        })
    };

    let mut offset = 0.0f32;
    let mut frames = 0usize;
    while offset < gallery.max_scroll() {
        offset = (offset + SCROLL_SPEED).min(gallery.max_scroll());
        throttle.call(offset);
        timers.run_due();
        frames += 1;

        // Each frame re-renders the scroll handler; equal deps keep its identity.
        let rendered = on_scroll.update(
            [Dep::from(QUESTION_COUNT)],
            scroll_handler(&gallery, &measured_offsets),
        );
        if rendered != handler {
            log::warn!("scroll handler identity changed at frame {frames}");
            handler = rendered;
        }
        std::thread::sleep(FRAME);
    }

    // Let the trailing scroll and any in-flight loads settle.
    while let Some(deadline) = timers.next_deadline() {
        let now = timers.now_millis();
        if deadline > now {
            std::thread::sleep(Duration::from_millis(deadline - now));
        }
        timers.run_due();
    }
    drop(throttle);

    let summary = gallery.summary();
    println!(
        "{frames} frames, {} throttled measurements, {} images reported loaded",
        measured_offsets.get(),
        gallery.loaded()
    );
    println!("{summary}");
    for (index, card) in gallery.cards().iter().enumerate() {
        if let Some(reason) = card.error_reason() {
            println!("  question {}: {} ({reason})", index + 1, card.descriptor().src);
        }
    }
    Ok(())
}

fn scroll_handler(gallery: &Rc<Gallery>, measured: &Rc<Cell<usize>>) -> impl FnMut(f32) + 'static {
    let gallery = Rc::clone(gallery);
    let measured = Rc::clone(measured);
    move |offset| {
        measured.set(measured.get() + 1);
        let delivered = gallery.scroll_to(offset);
        log::debug!("scrolled to {offset:.0}px, {delivered} visibility changes");
    }
}

#[cfg(not(feature = "fetch"))]
fn media_loader(timers: &TimerQueue) -> anyhow::Result<Rc<dyn MediaLoader>> {
    Ok(Rc::new(loader::SimulatedLoader::new(
        timers.clone(),
        Duration::from_millis(120),
    )))
}

#[cfg(feature = "fetch")]
fn media_loader(_timers: &TimerQueue) -> anyhow::Result<Rc<dyn MediaLoader>> {
    Ok(Rc::new(loader::HttpLoader::new()?))
}
