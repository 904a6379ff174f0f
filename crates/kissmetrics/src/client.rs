//! The KISSmetrics tracking client.
//!
//! All three operations build a fresh parameter map and go through
//! [`Client::request`], the only place where tracker responses are
//! interpreted.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::properties::{Properties, PropertyValue};
use crate::request::{
    apply_reserved, build_url, Clock, Endpoint, SystemClock, PARAM_NAME, PARAM_PERSON,
};
use crate::transport::{ReqwestTransport, Transport};

/// One alias or several, as accepted by [`Client::alias`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aliases(Vec<String>);

impl Aliases {
    /// The aliases in the order they were given.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Aliases {
    fn from(alias: &str) -> Self {
        Self(vec![alias.to_string()])
    }
}

impl From<String> for Aliases {
    fn from(alias: String) -> Self {
        Self(vec![alias])
    }
}

impl From<Vec<String>> for Aliases {
    fn from(aliases: Vec<String>) -> Self {
        Self(aliases)
    }
}

impl From<&[&str]> for Aliases {
    fn from(aliases: &[&str]) -> Self {
        Self(aliases.iter().map(|a| (*a).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Aliases {
    fn from(aliases: [&str; N]) -> Self {
        Self(aliases.iter().map(|a| (*a).to_string()).collect())
    }
}

/// Result of a single alias request.
#[derive(Debug)]
pub struct AliasOutcome {
    /// The alias that was sent.
    pub alias: String,
    /// How the request ended.
    pub result: Result<()>,
}

/// Per-alias results of [`Client::alias_detailed`], in input order.
#[derive(Debug, Default)]
pub struct AliasReport {
    /// One outcome per alias.
    pub outcomes: Vec<AliasOutcome>,
}

impl AliasReport {
    /// Whether every alias request succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Aliases whose request failed.
    pub fn failed(&self) -> impl Iterator<Item = &AliasOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Collapse into the first error by input order.
    ///
    /// # Errors
    ///
    /// Returns the first failed alias's error.
    pub fn into_result(self) -> Result<()> {
        self.outcomes
            .into_iter()
            .find_map(|o| o.result.err())
            .map_or(Ok(()), Err)
    }
}

#[derive(Debug)]
struct Inner {
    config: TrackerConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

/// Client for the KISSmetrics tracker.
///
/// Cloning is cheap; clones share the same configuration and transport.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::build(config, Arc::new(transport), Arc::new(SystemClock)))
    }

    /// Create a client with a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(config: TrackerConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport, Arc::new(SystemClock)))
    }

    /// Replace the clock used for `_t`.
    #[must_use]
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self::build(
            self.inner.config.clone(),
            Arc::clone(&self.inner.transport),
            clock,
        )
    }

    fn build(config: TrackerConfig, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                clock,
            }),
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Set properties on `person` without recording an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the tracker does not answer 200.
    pub async fn set_properties(&self, person: &str, properties: &Properties) -> Result<()> {
        let mut params = properties.clone();
        params.insert(PARAM_PERSON.to_string(), PropertyValue::from(person));
        self.request(Endpoint::Set, params).await
    }

    /// Record `event` for `person`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the tracker does not answer 200.
    pub async fn record(&self, person: &str, event: &str) -> Result<()> {
        self.record_with_properties(person, event, &Properties::new())
            .await
    }

    /// Record `event` for `person` and set `properties` on them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the tracker does not answer 200.
    pub async fn record_with_properties(
        &self,
        person: &str,
        event: &str,
        properties: &Properties,
    ) -> Result<()> {
        let mut params = properties.clone();
        params.insert(PARAM_PERSON.to_string(), PropertyValue::from(person));
        params.insert(PARAM_NAME.to_string(), PropertyValue::from(event));
        self.request(Endpoint::Record, params).await
    }

    /// Alias `person` to one or more identities.
    ///
    /// Requests are sent concurrently. The call returns once all of them have
    /// finished, with the first error to complete if any failed.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by any alias request.
    pub async fn alias(&self, person: &str, aliases: impl Into<Aliases>) -> Result<()> {
        let mut first_error = None;
        for (_, outcome) in self.fan_out_aliases(person, aliases.into()).await {
            if let Err(err) = outcome.result {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Alias `person` to one or more identities and report every outcome.
    ///
    /// This never fails as a whole: failures are carried per alias in the
    /// report, so check [`AliasReport::is_success`] or call
    /// [`AliasReport::into_result`].
    pub async fn alias_detailed(&self, person: &str, aliases: impl Into<Aliases>) -> AliasReport {
        let mut outcomes = self.fan_out_aliases(person, aliases.into()).await;
        outcomes.sort_by_key(|(index, _)| *index);
        AliasReport {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }

    /// Run one alias request per alias; results come back in completion order.
    async fn fan_out_aliases(&self, person: &str, aliases: Aliases) -> Vec<(usize, AliasOutcome)> {
        let mut tasks = JoinSet::new();
        let mut pending: Vec<Option<String>> = Vec::with_capacity(aliases.len());

        for (index, alias) in aliases.0.into_iter().enumerate() {
            let client = self.clone();
            let mut params = Properties::new();
            params.insert(PARAM_PERSON.to_string(), PropertyValue::from(person));
            params.insert(PARAM_NAME.to_string(), PropertyValue::from(alias.as_str()));
            pending.push(Some(alias));

            tasks.spawn(async move { (index, client.request(Endpoint::Alias, params).await) });
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    let alias = pending[index].take().unwrap_or_default();
                    outcomes.push((index, AliasOutcome { alias, result }));
                }
                Err(err) => warn!(error = %err, "alias task did not complete"),
            }
        }

        // A task that panicked never reported its index.
        for (index, alias) in pending.into_iter().enumerate() {
            if let Some(alias) = alias {
                outcomes.push((
                    index,
                    AliasOutcome {
                        alias,
                        result: Err(Error::TaskFailed("alias request aborted".to_string())),
                    },
                ));
            }
        }

        outcomes
    }

    /// Send one request to the tracker.
    ///
    /// Injects the API key and timestamp into `params`, issues a GET, and
    /// maps anything but a 200 into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if no response arrived,
    /// [`Error::UnexpectedStatus`] for a non-200 answer, or
    /// [`Error::InvalidUrl`] if the URL could not be built.
    pub async fn request(&self, endpoint: Endpoint, mut params: Properties) -> Result<()> {
        let config = &self.inner.config;
        apply_reserved(&mut params, config, self.inner.clock.now_millis());
        let url = build_url(config, endpoint, &params)?;

        debug!(
            endpoint = %endpoint,
            params = params.len(),
            "sending tracker request"
        );

        match self.inner.transport.get(&url).await {
            Err(source) => {
                warn!(endpoint = %endpoint, error = %source, "KISSmetrics transport error");
                Err(Error::transport(endpoint.path(), source))
            }
            Ok(200) => Ok(()),
            Ok(status) => {
                warn!(endpoint = %endpoint, status, "KISSmetrics returned unexpected status");
                Err(Error::UnexpectedStatus { status })
            }
        }
    }
}
