//! HTTP transport used to reach the tracker.
//!
//! The client only needs one thing from HTTP: issue a GET and report the
//! status code. Keeping that behind [`Transport`] lets tests script responses
//! without a network.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result, TransportError};

/// Something that can issue an HTTP GET.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a GET to `url` and return the response status code.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if no response was received.
    async fn get(&self, url: &Url) -> std::result::Result<u16, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport, optionally bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::HttpClient)?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> std::result::Result<u16, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_timeout() {
        assert!(ReqwestTransport::new(None).is_ok());
    }

    #[test]
    fn test_new_with_timeout() {
        assert!(ReqwestTransport::new(Some(Duration::from_secs(2))).is_ok());
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::new(Some(Duration::from_secs(5))).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/e")).unwrap();

        let result = transport.get(&url).await;
        assert!(result.is_err());
    }
}
