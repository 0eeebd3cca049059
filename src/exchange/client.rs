//! Entry point for building requests.
//!
//! A [`Client`] pairs an [`ExchangeConfig`] with a [`Transport`] and hands
//! out typed request builders. Cloning a client is cheap; clones share both.
//!
//! The free functions [`get`], [`post`], [`put`], [`patch`] and [`delete`]
//! build requests with a default client.

use std::fmt;
use std::sync::Arc;

use crate::config::ExchangeConfig;
use crate::exchange::builder::{mode, RequestBuilder};
use crate::exchange::descriptor::HttpMethod;
use crate::transport::{ReqwestTransport, Transport};

/// Creates typed request builders.
///
/// # Example
///
/// ```rust
/// use http_exchange::{Client, ExchangeConfig};
/// use std::time::Duration;
///
/// let config = ExchangeConfig::builder()
///     .socket_timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// let client = Client::with_config(config);
///
/// let descriptor = client.get("http://localhost/health").build().unwrap();
/// assert_eq!(descriptor.socket_timeout().as_duration(), Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ExchangeConfig>,
    transport: Arc<dyn Transport>,
}

// Verify Client is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Client>();
};

impl Client {
    /// Creates a client with default configuration and the reqwest transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExchangeConfig::default())
    }

    /// Creates a client with the given configuration and the reqwest transport.
    #[must_use]
    pub fn with_config(config: ExchangeConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client that sends requests through `transport`.
    #[must_use]
    pub fn with_transport(config: ExchangeConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Returns the configuration new builders start from.
    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Starts a GET request.
    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<mode::Get> {
        self.builder(HttpMethod::Get, url.into())
    }

    /// Starts a POST request.
    #[must_use]
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<mode::Modify> {
        self.builder(HttpMethod::Post, url.into())
    }

    /// Starts a PUT request.
    #[must_use]
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<mode::Modify> {
        self.builder(HttpMethod::Put, url.into())
    }

    /// Starts a PATCH request.
    #[must_use]
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<mode::Modify> {
        self.builder(HttpMethod::Patch, url.into())
    }

    /// Starts a DELETE request.
    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<mode::Modify> {
        self.builder(HttpMethod::Delete, url.into())
    }

    fn builder<M: mode::Mode>(&self, method: HttpMethod, url: String) -> RequestBuilder<M> {
        RequestBuilder::new(method, url, &self.config, Arc::clone(&self.transport))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Starts a GET request with a default [`Client`].
#[must_use]
pub fn get(url: impl Into<String>) -> RequestBuilder<mode::Get> {
    Client::new().get(url)
}

/// Starts a POST request with a default [`Client`].
#[must_use]
pub fn post(url: impl Into<String>) -> RequestBuilder<mode::Modify> {
    Client::new().post(url)
}

/// Starts a PUT request with a default [`Client`].
#[must_use]
pub fn put(url: impl Into<String>) -> RequestBuilder<mode::Modify> {
    Client::new().put(url)
}

/// Starts a PATCH request with a default [`Client`].
#[must_use]
pub fn patch(url: impl Into<String>) -> RequestBuilder<mode::Modify> {
    Client::new().patch(url)
}

/// Starts a DELETE request with a default [`Client`].
#[must_use]
pub fn delete(url: impl Into<String>) -> RequestBuilder<mode::Modify> {
    Client::new().delete(url)
}
