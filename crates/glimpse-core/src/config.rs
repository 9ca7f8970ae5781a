//! Process-wide configuration.
//!
//! The host reads the environment once at startup with
//! [`GlimpseConfig::from_env`] and installs the result with [`install_config`].
//! Library code reads it through [`config`] and never touches the environment.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEBUG_VAR: &str = "GLIMPSE_DEBUG";
pub const ROOT_MARGIN_VAR: &str = "GLIMPSE_ROOT_MARGIN";
pub const SCROLL_THROTTLE_VAR: &str = "GLIMPSE_SCROLL_THROTTLE_MS";
pub const SSR_VAR: &str = "GLIMPSE_SSR";

#[derive(Clone, Debug, PartialEq)]
pub struct GlimpseConfig {
    /// Log every visibility measurement at trace level.
    pub debug_visibility: bool,
    /// Root margin applied to trackers built with `TrackerConfiguration::from_config`.
    pub default_root_margin: String,
    /// Interval used by hosts to throttle scroll handlers.
    pub scroll_throttle: Duration,
    /// The host renders without a visibility capability; trackers trust their
    /// initial state.
    pub server_rendering: bool,
}

impl Default for GlimpseConfig {
    fn default() -> Self {
        Self {
            debug_visibility: false,
            default_root_margin: "0%".to_string(),
            scroll_throttle: Duration::from_millis(100),
            server_rendering: false,
        }
    }
}

impl GlimpseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds a configuration from `(name, value)` pairs. Unknown names are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (name, value) in vars {
            let value = value.as_ref().trim();
            match name.as_ref() {
                DEBUG_VAR => config.debug_visibility = parse_flag(DEBUG_VAR, value)?,
                SSR_VAR => config.server_rendering = parse_flag(SSR_VAR, value)?,
                ROOT_MARGIN_VAR => {
                    if value.is_empty() {
                        return Err(ConfigError::EmptyValue {
                            name: ROOT_MARGIN_VAR,
                        });
                    }
                    config.default_root_margin = value.to_string();
                }
                SCROLL_THROTTLE_VAR => {
                    let millis = value
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidNumber {
                            name: SCROLL_THROTTLE_VAR,
                            value: value.to_string(),
                        })?;
                    config.scroll_throttle = Duration::from_millis(millis);
                }
                _ => {}
            }
        }
        Ok(config)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
    EmptyValue { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name}: expected a boolean flag, got {value:?}")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name}: expected a non-negative integer, got {value:?}")
            }
            ConfigError::EmptyValue { name } => write!(f, "{name} must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

static CONFIG: OnceLock<GlimpseConfig> = OnceLock::new();
static DEFAULTS: OnceLock<GlimpseConfig> = OnceLock::new();

/// Installs the process configuration. Fails with the rejected value only if
/// a configuration was already installed.
///
/// Reading [`config`] beforehand does not block the install, but whatever was
/// built from those reads keeps the defaults. Install before building trackers.
pub fn install_config(config: GlimpseConfig) -> Result<(), GlimpseConfig> {
    CONFIG.set(config)
}

/// The installed configuration, or defaults while none is installed.
pub fn config() -> &'static GlimpseConfig {
    match CONFIG.get() {
        Some(config) => config,
        None => DEFAULTS.get_or_init(GlimpseConfig::default),
    }
}
