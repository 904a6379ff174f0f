//! Error types for the kissmetrics client.
//!
//! Every failure a tracking call can produce is surfaced through [`Error`];
//! nothing is retried and nothing panics.

use thiserror::Error;

/// Boxed error returned by a [`Transport`](crate::transport::Transport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for kissmetrics operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    /// The HTTP request could not be completed (DNS, connection refused, ...).
    #[error("KISSmetrics transport error on {path}: {source}")]
    Transport {
        /// Endpoint path the request was sent to.
        path: String,
        /// The error reported by the transport, unmodified.
        #[source]
        source: TransportError,
    },

    /// The tracker answered with something other than 200.
    #[error("KISSmetrics error: received wrong status code [{status}]")]
    UnexpectedStatus {
        /// The HTTP status code received.
        status: u16,
    },

    /// The request URL could not be built.
    #[error("invalid tracker URL {url}: {source}")]
    InvalidUrl {
        /// Scheme, host, port and path of the URL; the query is left out.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A fan-out task panicked or was cancelled before reporting.
    #[error("tracking task failed: {0}")]
    TaskFailed(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A specialized Result type for kissmetrics operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a transport error for a request sent to `path`.
    #[must_use]
    pub fn transport(path: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error came from the transport layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The HTTP status carried by an [`Error::UnexpectedStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status } => Some(*status),
            _ => None,
        }
    }
}
