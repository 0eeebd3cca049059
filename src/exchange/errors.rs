//! Error types for request exchanges.
//!
//! # Error Handling
//!
//! Every exchange operation reports failures through [`ExchangeError`]:
//!
//! - [`ExchangeError::Configuration`]: The builder was misused; nothing was sent
//! - [`ExchangeError::Validation`]: The response failed the success predicate
//! - [`ExchangeError::Decode`]: The status was acceptable but the body could not be decoded
//! - [`ExchangeError::Transport`]: The network call itself failed
//! - [`ExchangeError::Io`]: A downloaded body could not be written to disk
//!
//! All error types are `Clone` so that a single resolved promise can hand the
//! same failure to every consumer.
//!
//! # Example
//!
//! ```rust,ignore
//! use http_exchange::ExchangeError;
//!
//! match http_exchange::get(url).exchange_as_map() {
//!     Ok(exchange) => println!("{:?}", exchange.response_body()),
//!     Err(ExchangeError::Validation(e)) => println!("HTTP {}: {}", e.status, e.detail),
//!     Err(ExchangeError::Transport(e)) if e.is_timeout() => println!("timed out"),
//!     Err(e) => println!("{e}"),
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::ConfigurationError;

/// Error returned when a response fails the success-status predicate.
///
/// The `detail` field holds either the body decoding failure message or the
/// raw response text.
///
/// # Example
///
/// ```rust
/// use http_exchange::ValidationError;
/// use std::collections::BTreeMap;
///
/// let error = ValidationError {
///     status: 404,
///     status_text: "Not Found".to_string(),
///     headers: BTreeMap::new(),
///     detail: r#"{"error":"not found"}"#.to_string(),
/// };
///
/// assert_eq!(
///     error.to_string(),
///     r#"Response Status: 404(Not Found), Headers: {}, Detail: {"error":"not found"}"#
/// );
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Response Status: {status}({status_text}), Headers: {}, Detail: {detail}", HeaderList(.headers))]
pub struct ValidationError {
    /// The HTTP status code.
    pub status: u16,
    /// The canonical reason phrase for the status code.
    pub status_text: String,
    /// Response headers, keyed by lowercase name.
    pub headers: BTreeMap<String, Vec<String>>,
    /// Parse error message or raw body text.
    pub detail: String,
}

struct HeaderList<'a>(&'a BTreeMap<String, Vec<String>>);

impl fmt::Display for HeaderList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, values)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={}", values.join(","))?;
        }
        f.write_str("}")
    }
}

/// Error returned when a response body cannot be decoded into the requested shape.
#[derive(Clone, Debug, Error)]
#[error("Failed to decode response body: {message}")]
pub struct DecodeError {
    /// The decoder's description of the failure.
    pub message: String,
    #[source]
    source: Option<Arc<serde_json::Error>>,
}

impl DecodeError {
    /// Creates a decode error without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }
}

/// Broad classification of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection or socket timeout elapsed.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Any other network failure.
    Other,
}

/// Error returned when the underlying HTTP transport fails.
///
/// The exchange layer does not interpret these; they are propagated as-is.
#[derive(Clone, Debug, Error)]
#[error("Transport error: {message}")]
pub struct TransportError {
    /// Failure classification.
    pub kind: TransportErrorKind,
    /// Description from the transport.
    pub message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error without an underlying cause.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping the transport's own error value.
    #[must_use]
    pub fn with_source(
        kind: TransportErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let message = source.to_string();
        let source: Arc<dyn std::error::Error + Send + Sync> = Arc::new(source);
        Self {
            kind,
            message,
            source: Some(source),
        }
    }

    /// Returns `true` if the failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self::with_source(kind, error)
    }
}

/// Error returned when a downloaded body cannot be written to its target file.
#[derive(Clone, Debug, Error)]
#[error("Failed to write response body to '{path}': {message}")]
pub struct IoError {
    /// The target path.
    pub path: String,
    /// Description of the I/O failure.
    pub message: String,
    #[source]
    source: Option<Arc<std::io::Error>>,
}

impl IoError {
    pub(crate) fn new(path: impl Into<String>, error: std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }
}

/// Unified error type for all exchange operations.
#[derive(Clone, Debug, Error)]
pub enum ExchangeError {
    /// The builder was misused; the request never reached the transport.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The response failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The network call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be written to disk.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ExchangeError {
    /// Returns the validation failure, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExchangeError>();
};
