//! `kissmetrics` - An async client for the KISSmetrics tracking API
//!
//! Records events, sets person properties, and aliases identities by issuing
//! HTTP GET requests against a KISSmetrics tracker host.
//!
//! ```no_run
//! use kissmetrics::{Client, Properties, TrackerConfig};
//!
//! # async fn run() -> kissmetrics::Result<()> {
//! let client = Client::new(TrackerConfig::new("my-api-key"))?;
//!
//! let mut properties = Properties::new();
//! properties.insert("Plan".to_string(), "Pro".into());
//!
//! client.record_with_properties("bob@example.com", "Upgraded", &properties).await?;
//! client.alias("bob@example.com", ["bob", "robert"]).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod properties;
pub mod request;
pub mod transport;

pub use client::{AliasOutcome, AliasReport, Aliases, Client};
pub use config::{Config, TimestampPolicy, TrackerConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use properties::{Properties, PropertyValue};
pub use request::{Clock, Endpoint, FixedClock, SystemClock};
pub use transport::{ReqwestTransport, Transport};
