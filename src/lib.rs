//! # HTTP Exchange
//!
//! A typed request/response exchange framework over HTTP.
//!
//! ## Overview
//!
//! This crate provides:
//! - Typed request builders whose available methods depend on the HTTP
//!   method (a GET builder never exposes a body)
//! - Route parameter substitution, query parameters, headers, cookies and
//!   Basic authentication
//! - Validated, non-zero connection and socket timeouts via [`Timeout`]
//! - Blocking exchanges returning [`Exchange`]
//! - Non-blocking exchanges returning [`AsyncExchange`], whose response
//!   resolves exactly once
//! - A single response interpreter shared by both modes, so a non-2xx
//!   response produces the same [`ValidationError`] either way
//! - A pluggable [`Transport`], with a reqwest-backed default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http_exchange::Client;
//!
//! let client = Client::new();
//!
//! let user = client
//!     .get("http://localhost:8080/user/{name}/{dept}")
//!     .route_param("name", "Henry")
//!     .route_param("dept", "HR")
//!     .exchange_as_map()?;
//!
//! println!("{:?}", user.response_body());
//! ```
//!
//! ## Non-blocking Exchanges
//!
//! Non-blocking operations must be called from within a Tokio runtime.
//!
//! ```rust,ignore
//! use http_exchange::Client;
//! use serde_json::json;
//!
//! let exchange = Client::new()
//!     .post("http://localhost:8080/users")
//!     .body(&json!({"name": "Henry"}))
//!     .exchange_as_string_async_with_callback(|result| {
//!         if let Ok(response) = result {
//!             println!("status {}", http_exchange::StatusLine::status(response));
//!         }
//!     })?;
//!
//! let body = exchange.body().await?;
//! ```
//!
//! ## Error Handling
//!
//! Every exchange failure is an [`ExchangeError`]. Builder misuse is recorded
//! as a [`ConfigurationError`] and returned before anything is sent.
//!
//! ```rust
//! use http_exchange::{Client, ConfigurationError};
//! use std::time::Duration;
//!
//! let result = Client::new()
//!     .get("http://localhost/")
//!     .connection_timeout(Duration::ZERO)
//!     .build();
//!
//! assert!(matches!(result, Err(ConfigurationError::ZeroTimeout { .. })));
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration lives in a [`Client`]
//! - **Fail before sending**: Invalid configuration never reaches the transport
//! - **Thread-safe**: Clients, responses and errors are `Send + Sync`
//! - **Exactly once**: A non-blocking response resolves a single time

pub mod config;
pub mod error;
pub mod exchange;
pub mod transport;

// Re-export public types at crate root for convenience
pub use config::{BasicCredentials, ExchangeConfig, ExchangeConfigBuilder, Timeout, CRATE_VERSION};
pub use error::ConfigurationError;

// Re-export exchange types
pub use exchange::{
    delete, get, is_success_status, mode, patch, post, put, to_map, validated_body,
    AsyncExchange, Callback, Client, Cookie, DecodeError, Exchange, ExchangeError,
    ExchangeResult, FileOptions, HttpMethod, HttpResponse, IoError, PreparedRequest, RawResponse,
    RequestBody, RequestBuilder, RequestDescriptor, ResponsePromise, StatusLine, TransportError,
    TransportErrorKind, ValidationError,
};

// Re-export transport types
pub use transport::{ReqwestTransport, Transport};
