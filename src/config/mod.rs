//! Configuration types for the exchange framework.
//!
//! This module provides the defaults every request builder starts from.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ExchangeConfig`]: Default timeouts and headers applied to new builders
//! - [`ExchangeConfigBuilder`]: A builder for constructing [`ExchangeConfig`] instances
//! - [`Timeout`]: A validated, non-zero timeout
//! - [`BasicCredentials`]: Basic authentication credentials with masked debug output
//!
//! # Example
//!
//! ```rust
//! use http_exchange::ExchangeConfig;
//! use std::time::Duration;
//!
//! let config = ExchangeConfig::builder()
//!     .connection_timeout(Duration::from_secs(2))
//!     .default_header("X-Tenant", "acme")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.connection_timeout().as_duration(), Duration::from_secs(2));
//! ```

mod newtypes;

pub use newtypes::{BasicCredentials, Timeout};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::error::ConfigurationError;

/// Crate version from Cargo.toml.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Defaults applied to every request builder created by a
/// [`Client`](crate::Client).
///
/// # Thread Safety
///
/// `ExchangeConfig` is `Clone`, `Send`, and `Sync`; clients share it behind an
/// `Arc`.
#[derive(Clone, Debug)]
pub struct ExchangeConfig {
    connection_timeout: Timeout,
    socket_timeout: Timeout,
    default_headers: HeaderMap,
}

impl ExchangeConfig {
    /// Creates a new builder for constructing an `ExchangeConfig`.
    #[must_use]
    pub fn builder() -> ExchangeConfigBuilder {
        ExchangeConfigBuilder::new()
    }

    /// Returns the default connection timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Timeout {
        self.connection_timeout
    }

    /// Returns the default socket timeout.
    #[must_use]
    pub const fn socket_timeout(&self) -> Timeout {
        self.socket_timeout
    }

    /// Returns the headers added to every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, default_user_agent());
        Self {
            connection_timeout: Timeout::default_connection(),
            socket_timeout: Timeout::default_socket(),
            default_headers,
        }
    }
}

fn default_user_agent() -> HeaderValue {
    HeaderValue::from_str(&format!("http-exchange/{CRATE_VERSION}"))
        .unwrap_or_else(|_| HeaderValue::from_static("http-exchange"))
}

// Verify ExchangeConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExchangeConfig>();
};

/// Builder for constructing [`ExchangeConfig`] instances.
///
/// # Defaults
///
/// - `connection_timeout`: 5 seconds
/// - `socket_timeout`: 30 seconds
/// - `user_agent`: `http-exchange/<version>`
/// - `default_accept`: `None`
#[derive(Debug, Default)]
pub struct ExchangeConfigBuilder {
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_accept: Option<String>,
    default_headers: Vec<(String, String)>,
}

impl ExchangeConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Sets the default socket timeout.
    #[must_use]
    pub const fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = Some(timeout);
        self
    }

    /// Overrides the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the `Accept` header used when a builder does not set one.
    #[must_use]
    pub fn default_accept(mut self, accept: impl Into<String>) -> Self {
        self.default_accept = Some(accept.into());
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the [`ExchangeConfig`], validating every value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroTimeout`] for a zero timeout and
    /// [`ConfigurationError::InvalidHeader`] for a header that cannot be sent.
    pub fn build(self) -> Result<ExchangeConfig, ConfigurationError> {
        let connection_timeout = match self.connection_timeout {
            Some(duration) => Timeout::new("connection_timeout", duration)?,
            None => Timeout::default_connection(),
        };
        let socket_timeout = match self.socket_timeout {
            Some(duration) => Timeout::new("socket_timeout", duration)?,
            None => Timeout::default_socket(),
        };

        let mut default_headers = HeaderMap::new();
        let user_agent = match self.user_agent {
            Some(user_agent) => header_value("user-agent", &user_agent)?,
            None => default_user_agent(),
        };
        default_headers.insert(USER_AGENT, user_agent);
        if let Some(accept) = self.default_accept {
            default_headers.insert(reqwest::header::ACCEPT, header_value("accept", &accept)?);
        }
        for (name, value) in self.default_headers {
            let header = header_name(&name)?;
            default_headers.append(header, header_value(&name, &value)?);
        }

        Ok(ExchangeConfig {
            connection_timeout,
            socket_timeout,
            default_headers,
        })
    }
}

/// Parses a header name, mapping failures to [`ConfigurationError::InvalidHeader`].
pub(crate) fn header_name(name: &str) -> Result<HeaderName, ConfigurationError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigurationError::InvalidHeader {
        name: name.to_string(),
    })
}

/// Parses a header value, mapping failures to [`ConfigurationError::InvalidHeader`].
pub(crate) fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigurationError> {
    HeaderValue::from_str(value).map_err(|_| ConfigurationError::InvalidHeader {
        name: name.to_string(),
    })
}
