//! Request exchanges.
//!
//! This module contains the request builders, the blocking and non-blocking
//! exchange operations, the shared response interpreter, and the error types
//! they report.
//!
//! # Overview
//!
//! - [`Client`]: Hands out typed [`RequestBuilder`]s
//! - [`RequestBuilder`]: Accumulates a [`RequestDescriptor`] and dispatches it
//! - [`Exchange`]: The result of a blocking exchange
//! - [`AsyncExchange`]: A dispatched non-blocking exchange and its [`ResponsePromise`]
//! - [`is_success_status`], [`to_map`], [`validated_body`]: Response interpretation
//!   shared by both modes
//! - [`ExchangeError`]: Unified error type

pub mod builder;
mod blocking;
mod client;
mod descriptor;
mod errors;
mod interpreter;
mod nonblocking;
mod response;

pub use blocking::Exchange;
pub use builder::{mode, RequestBuilder};
pub use client::{delete, get, patch, post, put, Client};
pub use descriptor::{
    Cookie, HttpMethod, PreparedRequest, RequestBody, RequestDescriptor, FORM_CONTENT_TYPE,
    JSON_CONTENT_TYPE,
};
pub use errors::{
    DecodeError, ExchangeError, IoError, TransportError, TransportErrorKind, ValidationError,
};
pub use interpreter::{is_success_status, to_map, validated_body};
pub use nonblocking::{AsyncExchange, Callback, ExchangeResult, ResponsePromise};
pub use response::{FileOptions, HttpResponse, RawResponse, StatusLine};
