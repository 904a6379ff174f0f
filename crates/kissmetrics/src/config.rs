//! Configuration management for the kissmetrics client.
//!
//! [`TrackerConfig`] is what a [`Client`](crate::Client) is built from. The
//! surrounding [`Config`] loads it with figment from TOML files, environment
//! variables, and defaults.

use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Host;

use crate::error::{Error, Result};

/// Default tracker host.
pub const DEFAULT_TRACKER_HOST: &str = "trk.kissmetrics.com";

/// Default tracker port.
pub const DEFAULT_TRACKER_PORT: u16 = 80;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "kissmetrics";

/// Environment variable prefix.
const ENV_PREFIX: &str = "KISSMETRICS_";

/// How the `_t` timestamp parameter is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// A caller-supplied `_t` is kept. Otherwise `_t` is omitted when `_d`
    /// is present and set to the current time when it is not.
    #[default]
    HonorExplicit,
    /// Only keep the caller's `_t` (possibly absent) when `_d` is present;
    /// without `_d` the current time always wins.
    Legacy,
}

/// Connection settings for a tracking client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// The KISSmetrics API key.
    pub key: String,
    /// Tracker host name.
    pub host: String,
    /// Tracker port.
    pub port: u16,
    /// Per-request timeout in milliseconds. Unset means the HTTP client's
    /// own defaults apply.
    pub timeout_ms: Option<u64>,
    /// Timestamp handling for requests.
    pub timestamp_policy: TimestampPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            host: DEFAULT_TRACKER_HOST.to_string(),
            port: DEFAULT_TRACKER_PORT,
            timeout_ms: None,
            timestamp_policy: TimestampPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Create a configuration for `key` against the default tracker.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Override the tracker host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override the tracker port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the timestamp policy.
    #[must_use]
    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse the configured host.
    ///
    /// A bare IPv6 literal such as `::1` is accepted as well as the bracketed
    /// `[::1]` form.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the host is not a domain or IP address.
    pub fn parsed_host(&self) -> std::result::Result<Host, url::ParseError> {
        match self.host.parse::<Ipv6Addr>() {
            Ok(addr) => Ok(Host::Ipv6(addr)),
            Err(_) => Host::parse(&self.host),
        }
    }

    /// Validate everything except the API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty or not a valid host name, or the
    /// port or timeout is zero.
    pub fn validate_endpoint(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config_validation("host must not be empty"));
        }

        if let Err(err) = self.parsed_host() {
            return Err(Error::config_validation(format!(
                "host '{}' is not a valid host name: {err}",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(Error::config_validation("port must be greater than 0"));
        }

        if self.timeout_ms == Some(0) {
            return Err(Error::config_validation(
                "timeout_ms must be greater than 0 when set",
            ));
        }

        Ok(())
    }

    /// Validate the configuration for building a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the endpoint is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(Error::config_validation("key must not be empty"));
        }
        self.validate_endpoint()
    }
}

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `KISSMETRICS_`, `__` between levels)
/// 2. TOML config file at `~/.config/kissmetrics/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracker configuration.
    pub tracker: TrackerConfig,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(&Self::figment(config_file))
    }

    fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// The API key is not required here so that configuration can be shown
    /// and checked before one is set; it is enforced when a client is built.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.tracker.validate_endpoint()
    }
}
