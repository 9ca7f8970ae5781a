//! Installing the process configuration. Runs in its own test binary so the
//! global is untouched by other tests.

use glimpse_core::{config, install_config, GlimpseConfig};
use std::time::Duration;

#[test]
fn install_succeeds_after_defaults_were_read() {
    assert_eq!(*config(), GlimpseConfig::default());

    let installed = GlimpseConfig {
        server_rendering: true,
        scroll_throttle: Duration::from_millis(40),
        ..GlimpseConfig::default()
    };
    assert_eq!(install_config(installed.clone()), Ok(()));
    assert_eq!(*config(), installed);

    let rejected = GlimpseConfig::default();
    assert_eq!(install_config(rejected.clone()), Err(rejected));
    assert_eq!(*config(), installed);
}
