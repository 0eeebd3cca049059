//! Configuration error types for the exchange framework.
//!
//! This module contains the error raised when a request builder or an
//! [`ExchangeConfig`](crate::ExchangeConfig) is used incorrectly.
//!
//! # Error Handling
//!
//! Configuration problems are detected before any network I/O happens. The
//! fluent builder records the first problem it sees and every exchange
//! operation returns it instead of dispatching.
//!
//! # Example
//!
//! ```rust
//! use http_exchange::{ConfigurationError, Timeout};
//! use std::time::Duration;
//!
//! let result = Timeout::new("connection_timeout", Duration::ZERO);
//! assert!(matches!(result, Err(ConfigurationError::ZeroTimeout { .. })));
//! ```

use thiserror::Error;

/// Errors raised by malformed builder or configuration usage.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A timeout was set to zero.
    #[error("Invalid {field}: timeouts must be greater than zero.")]
    ZeroTimeout {
        /// The timeout setting that was rejected.
        field: &'static str,
    },

    /// The URL template references a route parameter that was never supplied.
    #[error("Missing route parameter '{name}'. Supply it with route_param before executing the request.")]
    MissingRouteParameter {
        /// The placeholder name without braces.
        name: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The request body could not be serialized.
    #[error("Invalid request body: {reason}")]
    InvalidBody {
        /// Why serialization failed.
        reason: String,
    },

    /// The URL template is unusable (empty or contains an unterminated placeholder).
    #[error("Invalid URL '{url}'.")]
    InvalidUrl {
        /// The URL template that was provided.
        url: String,
    },

    /// A non-blocking exchange was started outside of a Tokio runtime.
    #[error("Non-blocking exchanges must be started from within a Tokio runtime.")]
    NoAsyncRuntime,
}
