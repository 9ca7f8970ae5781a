#[cfg(not(feature = "fetch"))]
use glimpse_core::{TimerQueue, TimerRegistration};
use glimpse_foundation::{LoadCompletion, MediaLoader, MediaRequest};
#[cfg(not(feature = "fetch"))]
use std::cell::RefCell;
use std::time::Duration;

/// Resolves every request after a fixed latency; sources containing
/// `missing` fail with a 404.
#[cfg(not(feature = "fetch"))]
pub struct SimulatedLoader {
    timers: TimerQueue,
    latency: Duration,
    in_flight: RefCell<Vec<TimerRegistration>>,
}

#[cfg(not(feature = "fetch"))]
impl SimulatedLoader {
    pub fn new(timers: TimerQueue, latency: Duration) -> Self {
        Self {
            timers,
            latency,
            in_flight: RefCell::new(Vec::new()),
        }
    }
}

#[cfg(not(feature = "fetch"))]
impl MediaLoader for SimulatedLoader {
    fn load(&self, request: MediaRequest, completion: LoadCompletion) {
        log::info!("fetching {}", request.src);
        // Priority media skips the simulated network queue.
        let latency = if request.priority {
            Duration::ZERO
        } else {
            self.latency
        };
        let registration = self.timers.schedule(latency, move || {
            if request.src.contains("missing") {
                completion.fail("404 Not Found");
            } else {
                completion.succeed();
            }
        });
        let mut in_flight = self.in_flight.borrow_mut();
        in_flight.retain(TimerRegistration::is_pending);
        in_flight.push(registration);
    }
}

/// Checks each image with a blocking HEAD request.
#[cfg(feature = "fetch")]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "fetch")]
impl HttpLoader {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("glimpse-gallery-demo/0.1")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "fetch")]
impl MediaLoader for HttpLoader {
    fn load(&self, request: MediaRequest, completion: LoadCompletion) {
        log::info!("fetching {}", request.src);
        match self.client.head(&request.src).send() {
            Ok(response) if response.status().is_success() => completion.succeed(),
            Ok(response) => completion.fail(format!("HTTP {}", response.status())),
            Err(err) => completion.fail(format!("request failed: {err}")),
        }
    }
}
