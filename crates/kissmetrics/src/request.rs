//! Tracker request encoding.
//!
//! Turns a property mapping into the URL of a single tracker call: reserved
//! parameters are merged in, the query string is built and percent-encoded,
//! and the result is parsed into a [`Url`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::{TimestampPolicy, TrackerConfig};
use crate::error::{Error, Result};
use crate::properties::{Properties, PropertyValue};

/// Person identifier parameter.
pub const PARAM_PERSON: &str = "_p";
/// Event or alias name parameter.
pub const PARAM_NAME: &str = "_n";
/// API key parameter.
pub const PARAM_KEY: &str = "_k";
/// Timestamp parameter, milliseconds since the epoch.
pub const PARAM_TIMESTAMP: &str = "_t";
/// Date override flag.
pub const PARAM_DATE_OVERRIDE: &str = "_d";

/// Characters left as-is inside a query key or value.
///
/// Everything else, including `&`, `=`, `+`, `#` and space, is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A tracker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Set properties on a person.
    Set,
    /// Alias a person to another identity.
    Alias,
    /// Record an event.
    Record,
}

impl Endpoint {
    /// URL path for this endpoint.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Set => "/s",
            Self::Alias => "/a",
            Self::Record => "/e",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Source of the current time for `_t`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock stuck at one instant, for reproducible requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Inject the API key and timestamp into `params`.
pub fn apply_reserved(params: &mut Properties, config: &TrackerConfig, now_millis: i64) {
    params.insert(PARAM_KEY.to_string(), PropertyValue::from(config.key.as_str()));

    let has_override = params.contains_key(PARAM_DATE_OVERRIDE);
    let has_timestamp = params.contains_key(PARAM_TIMESTAMP);

    let stamp_now = match config.timestamp_policy {
        TimestampPolicy::Legacy => !has_override,
        TimestampPolicy::HonorExplicit => !has_override && !has_timestamp,
    };

    if stamp_now {
        params.insert(PARAM_TIMESTAMP.to_string(), PropertyValue::Integer(now_millis));
    }
}

/// Serialize `params` as `k=v` pairs joined by `&`, in map order.
#[must_use]
pub fn encode_query(params: &Properties) -> String {
    let mut query = String::new();
    for (key, value) in params {
        if !query.is_empty() {
            query.push('&');
        }
        query.extend(utf8_percent_encode(key, QUERY_COMPONENT));
        query.push('=');
        query.extend(utf8_percent_encode(&value.to_string(), QUERY_COMPONENT));
    }
    query
}

/// Build the full tracker URL for `endpoint` with the given parameters.
///
/// The host, port, path and query are set separately, so a host holding
/// `/`, `?` or `#` is rejected instead of moving the request elsewhere. A
/// bare IPv6 host is bracketed.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the host does not form a valid URL.
pub fn build_url(config: &TrackerConfig, endpoint: Endpoint, params: &Properties) -> Result<Url> {
    let invalid = |source: url::ParseError| Error::InvalidUrl {
        url: format!("http://{}:{}{}", config.host, config.port, endpoint.path()),
        source,
    };

    let host = config.parsed_host().map_err(invalid)?;
    let mut url = Url::parse("http://localhost/").map_err(invalid)?;
    url.set_host(Some(&host.to_string())).map_err(invalid)?;
    url.set_port(Some(config.port))
        .map_err(|()| invalid(url::ParseError::InvalidPort))?;
    url.set_path(endpoint.path());
    url.set_query(Some(&encode_query(params)));

    Ok(url)
}
