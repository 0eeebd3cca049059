//! Blocking exchanges.
//!
//! Each operation sends the request on the calling thread and returns once the
//! transport has produced a response or failed. No retries are attempted.
//!
//! Do not call these from inside an async task; use the `*_async`
//! operations there.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::exchange::builder::{mode::Mode, RequestBuilder};
use crate::exchange::descriptor::PreparedRequest;
use crate::exchange::errors::ExchangeError;
use crate::exchange::interpreter::{is_success_status, to_map, validated_body};
use crate::exchange::response::{
    empty_reader, file_reader, object_reader, string_reader, BodyOutcome, FileOptions,
    HttpResponse, RawResponse, StatusLine,
};

/// The completed result of a blocking exchange.
///
/// Immutable once created.
#[derive(Clone, Debug)]
pub struct Exchange<R> {
    request: PreparedRequest,
    response: HttpResponse<R>,
}

impl<R> Exchange<R> {
    /// Returns the request that was sent.
    #[must_use]
    pub const fn request(&self) -> &PreparedRequest {
        &self.request
    }

    /// Returns the full response.
    #[must_use]
    pub const fn response(&self) -> &HttpResponse<R> {
        &self.response
    }

    /// Returns the decoded body, if decoding succeeded.
    #[must_use]
    pub const fn response_body(&self) -> Option<&R> {
        self.response.body()
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.response.status()
    }

    /// Returns the body if the status is 2xx.
    ///
    /// # Errors
    ///
    /// See [`validated_body`].
    pub fn body(&self) -> Result<&R, ExchangeError> {
        validated_body(&self.response, |response| is_success_status(response))
    }

    /// Returns the body if `validator` accepts the response.
    ///
    /// # Errors
    ///
    /// See [`validated_body`].
    pub fn body_with<F>(&self, validator: F) -> Result<&R, ExchangeError>
    where
        F: FnOnce(&HttpResponse<R>) -> bool,
    {
        validated_body(&self.response, validator)
    }

    /// Consumes the exchange, returning the response.
    #[must_use]
    pub fn into_response(self) -> HttpResponse<R> {
        self.response
    }
}

impl<M: Mode> RequestBuilder<M> {
    /// Sends the request and ignores the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Configuration`] if the builder was misused and
    /// [`ExchangeError::Transport`] if the call failed.
    pub fn exchange_empty(self) -> Result<Exchange<()>, ExchangeError> {
        self.execute(empty_reader())
    }

    /// Sends the request and decodes the JSON body into `T`.
    ///
    /// A body that does not decode is reported through
    /// [`HttpResponse::parsing_error`], not as a failed exchange.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Configuration`] or [`ExchangeError::Transport`].
    pub fn exchange<T>(self) -> Result<Exchange<T>, ExchangeError>
    where
        T: DeserializeOwned + 'static,
    {
        self.execute(object_reader())
    }

    /// Sends the request and converts the raw response with `mapper`.
    ///
    /// The mapper runs on the calling thread, so it may borrow local state.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Configuration`], [`ExchangeError::Transport`],
    /// or whatever `mapper` returns.
    pub fn exchange_with<R, F>(self, mapper: F) -> Result<Exchange<R>, ExchangeError>
    where
        F: FnOnce(&RawResponse) -> Result<R, ExchangeError>,
    {
        self.execute(|raw: &RawResponse| mapper(raw).map(BodyOutcome::Parsed))
    }

    /// Sends the request and reads the body as text.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Configuration`] or [`ExchangeError::Transport`].
    pub fn exchange_as_string(self) -> Result<Exchange<String>, ExchangeError> {
        self.execute(string_reader())
    }

    /// Sends the request and writes the body to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Io`] if the file cannot be written, including
    /// when it already exists and `options.replace_existing` is not set.
    pub fn exchange_as_file(
        self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<Exchange<PathBuf>, ExchangeError> {
        self.execute(file_reader(path.as_ref().to_path_buf(), options))
    }

    /// Sends the request and decodes a 2xx JSON body into a map.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Validation`] for a non-2xx response and
    /// [`ExchangeError::Decode`] if the body is not a JSON object.
    pub fn exchange_as_map(self) -> Result<Exchange<Map<String, Value>>, ExchangeError> {
        self.exchange_with(|raw| to_map(raw, |response| is_success_status(response)))
    }

    fn execute<R, F>(self, reader: F) -> Result<Exchange<R>, ExchangeError>
    where
        F: FnOnce(&RawResponse) -> Result<BodyOutcome<R>, ExchangeError>,
    {
        let (request, transport) = self.prepare()?;
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            connect_timeout_ms = request.connection_timeout().as_millis(),
            socket_timeout_ms = request.socket_timeout().as_millis(),
            "sending blocking request"
        );

        let raw = transport.execute(&request)?;
        tracing::debug!(status = raw.status(), url = %request.url(), "received response");

        let outcome = reader(&raw)?;
        Ok(Exchange {
            request,
            response: HttpResponse::from_outcome(raw, outcome),
        })
    }
}
