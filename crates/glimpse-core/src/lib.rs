#![doc = r"Single-threaded runtime pieces for Glimpse: signals, timers, throttling and stable callbacks."]

mod collections;
pub mod config;
pub mod owned;
pub mod platform;
pub mod signal;
pub mod stable_callback;
pub mod throttle;
pub mod timer;

pub use config::{config, install_config, ConfigError, GlimpseConfig};
pub use owned::{Owned, WeakOwned};
pub use platform::{Clock, SystemClock};
pub use signal::{Signal, WatchRegistration};
pub use stable_callback::{deps_changed, Callback, Dep, StableCallback};
pub use throttle::Throttle;
pub use timer::{TimerId, TimerQueue, TimerRegistration};
