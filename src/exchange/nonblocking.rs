//! Non-blocking exchanges.
//!
//! Each `*_async` operation resolves the request, spawns the transport call
//! on the current Tokio runtime and returns immediately with an
//! [`AsyncExchange`]. Its response is a [`ResponsePromise`]: a shared future
//! that resolves exactly once, to a response or to a failure. Cloning the
//! promise, deriving a body future or adapting it into a stream never sends
//! the request again.
//!
//! The `*_with_callback` variants additionally invoke a callback once, on the
//! runtime, right after the promise resolves. A panicking callback does not
//! change what the promise resolved to.
//!
//! # Example
//!
//! ```rust,ignore
//! use http_exchange::Client;
//!
//! let client = Client::new();
//! let exchange = client
//!     .post("http://localhost:8080/users")
//!     .body(&serde_json::json!({"name": "Henry"}))
//!     .exchange_as_string_async()?;
//!
//! // Fails with ExchangeError::Validation for a non-2xx response.
//! let body = exchange.body().await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::exchange::builder::{mode::Mode, RequestBuilder};
use crate::exchange::descriptor::PreparedRequest;
use crate::exchange::errors::{ExchangeError, TransportError, TransportErrorKind};
use crate::exchange::interpreter::{is_success_status, to_map, validated_body};
use crate::exchange::response::{
    empty_reader, file_reader, mapping_reader, object_reader, string_reader, BodyReader,
    FileOptions, HttpResponse, RawResponse, StatusLine,
};
use crate::transport::Transport;

/// Outcome of a non-blocking exchange.
pub type ExchangeResult<R> = Result<Arc<HttpResponse<R>>, ExchangeError>;

/// A single-assignment handle to the response of a non-blocking exchange.
///
/// Clones share one resolution.
pub type ResponsePromise<R> = Shared<BoxFuture<'static, ExchangeResult<R>>>;

/// Completion callback, invoked exactly once after the promise resolves.
pub type Callback<R> = Box<dyn FnOnce(Result<&HttpResponse<R>, &ExchangeError>) + Send>;

/// A dispatched non-blocking exchange.
pub struct AsyncExchange<R> {
    request: Arc<PreparedRequest>,
    response: ResponsePromise<R>,
}

impl<R> Clone for AsyncExchange<R> {
    fn clone(&self) -> Self {
        Self {
            request: Arc::clone(&self.request),
            response: self.response.clone(),
        }
    }
}

impl<R> std::fmt::Debug for AsyncExchange<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExchange")
            .field("request", &self.request)
            .field("resolved", &self.response.peek().is_some())
            .finish()
    }
}

impl<R> AsyncExchange<R>
where
    R: Send + Sync + 'static,
{
    /// Returns the request that was sent.
    #[must_use]
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    /// Returns a handle to the response.
    #[must_use]
    pub fn response(&self) -> ResponsePromise<R> {
        self.response.clone()
    }

    /// Returns the outcome if the exchange has already resolved.
    #[must_use]
    pub fn try_response(&self) -> Option<ExchangeResult<R>> {
        self.response.peek().cloned()
    }

    /// Blocks the current thread until the exchange resolves.
    ///
    /// Repeated calls return the already resolved outcome. Calling this from
    /// a single-threaded runtime deadlocks.
    ///
    /// # Errors
    ///
    /// Returns the exchange failure, if any.
    #[deprecated(note = "use `response().await` or a blocking `exchange_*` operation instead")]
    pub fn wait_response(&self) -> ExchangeResult<R> {
        tracing::warn!(
            url = %self.request.url(),
            "blocking on a non-blocking exchange; use a blocking exchange operation instead"
        );
        futures::executor::block_on(self.response.clone())
    }

    /// Adapts the response into a single-item stream.
    #[must_use]
    pub fn response_stream(&self) -> BoxStream<'static, ExchangeResult<R>> {
        stream::once(self.response.clone()).boxed()
    }
}

impl<R> AsyncExchange<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Returns a future of the body that fails unless the status is 2xx.
    ///
    /// A rejected response fails with [`ExchangeError::Validation`] carrying
    /// the status, headers and either the decoding failure or the raw body.
    #[must_use]
    pub fn body(&self) -> BoxFuture<'static, Result<R, ExchangeError>> {
        self.body_with(|response| is_success_status(response))
    }

    /// Returns a future of the body that fails unless `validator` accepts the
    /// response.
    #[must_use]
    pub fn body_with<F>(&self, validator: F) -> BoxFuture<'static, Result<R, ExchangeError>>
    where
        F: FnOnce(&HttpResponse<R>) -> bool + Send + 'static,
    {
        self.response
            .clone()
            .map(move |result| {
                let response = result?;
                validated_body(&*response, validator).cloned()
            })
            .boxed()
    }

    /// Adapts the validated body into a single-item stream.
    #[must_use]
    pub fn body_stream(&self) -> BoxStream<'static, Result<R, ExchangeError>> {
        stream::once(self.body()).boxed()
    }

    /// Adapts the body, validated by `validator`, into a single-item stream.
    #[must_use]
    pub fn body_stream_with<F>(&self, validator: F) -> BoxStream<'static, Result<R, ExchangeError>>
    where
        F: FnOnce(&HttpResponse<R>) -> bool + Send + 'static,
    {
        stream::once(self.body_with(validator)).boxed()
    }
}

impl<M: Mode> RequestBuilder<M> {
    /// Starts the request, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the builder was misused or no Tokio
    /// runtime is running.
    pub fn exchange_empty_async(self) -> Result<AsyncExchange<()>, ConfigurationError> {
        self.dispatch(empty_reader(), None)
    }

    /// Starts the request and invokes `callback` once it resolves.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_empty_async_with_callback<C>(
        self,
        callback: C,
    ) -> Result<AsyncExchange<()>, ConfigurationError>
    where
        C: FnOnce(Result<&HttpResponse<()>, &ExchangeError>) + Send + 'static,
    {
        self.dispatch(empty_reader(), Some(Box::new(callback) as Callback<_>))
    }

    /// Starts the request, reading the body as text.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_string_async(self) -> Result<AsyncExchange<String>, ConfigurationError> {
        self.dispatch(string_reader(), None)
    }

    /// Starts the request, reading the body as text, and invokes `callback`
    /// once it resolves.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_string_async_with_callback<C>(
        self,
        callback: C,
    ) -> Result<AsyncExchange<String>, ConfigurationError>
    where
        C: FnOnce(Result<&HttpResponse<String>, &ExchangeError>) + Send + 'static,
    {
        self.dispatch(string_reader(), Some(Box::new(callback) as Callback<_>))
    }

    /// Starts the request, decoding the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_object_async<T>(self) -> Result<AsyncExchange<T>, ConfigurationError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.dispatch(object_reader(), None)
    }

    /// Starts the request, decoding the JSON body into `T`, and invokes
    /// `callback` once it resolves.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_object_async_with_callback<T, C>(
        self,
        callback: C,
    ) -> Result<AsyncExchange<T>, ConfigurationError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        C: FnOnce(Result<&HttpResponse<T>, &ExchangeError>) + Send + 'static,
    {
        self.dispatch(object_reader(), Some(Box::new(callback) as Callback<_>))
    }

    /// Starts the request, converting the raw response with `mapper`.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_with_async<R, F>(self, mapper: F) -> Result<AsyncExchange<R>, ConfigurationError>
    where
        R: Send + Sync + 'static,
        F: FnOnce(&RawResponse) -> Result<R, ExchangeError> + Send + 'static,
    {
        self.dispatch(mapping_reader(mapper), None)
    }

    /// Starts the request, writing the body to `path`.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_file_async(
        self,
        path: impl AsRef<Path>,
        options: FileOptions,
    ) -> Result<AsyncExchange<PathBuf>, ConfigurationError> {
        self.dispatch(file_reader(path.as_ref().to_path_buf(), options), None)
    }

    /// Starts the request, writing the body to `path`, and invokes `callback`
    /// once it resolves.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_file_async_with_callback<C>(
        self,
        path: impl AsRef<Path>,
        options: FileOptions,
        callback: C,
    ) -> Result<AsyncExchange<PathBuf>, ConfigurationError>
    where
        C: FnOnce(Result<&HttpResponse<PathBuf>, &ExchangeError>) + Send + 'static,
    {
        self.dispatch(
            file_reader(path.as_ref().to_path_buf(), options),
            Some(Box::new(callback) as Callback<_>),
        )
    }

    /// Starts the request, decoding a 2xx JSON body into a map.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_map_async(
        self,
    ) -> Result<AsyncExchange<Map<String, Value>>, ConfigurationError> {
        self.exchange_as_map_async_with(|response| is_success_status(response))
    }

    /// Starts the request, decoding the JSON body into a map if `validator`
    /// accepts the response.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_map_async_with<F>(
        self,
        validator: F,
    ) -> Result<AsyncExchange<Map<String, Value>>, ConfigurationError>
    where
        F: Fn(&RawResponse) -> bool + Send + 'static,
    {
        self.exchange_with_async(move |raw| to_map(raw, validator))
    }

    /// Starts the request, decoding a 2xx JSON body into a map, and invokes
    /// `callback` once it resolves.
    ///
    /// # Errors
    ///
    /// See [`exchange_empty_async`](Self::exchange_empty_async).
    pub fn exchange_as_map_async_with_callback<C>(
        self,
        callback: C,
    ) -> Result<AsyncExchange<Map<String, Value>>, ConfigurationError>
    where
        C: FnOnce(Result<&HttpResponse<Map<String, Value>>, &ExchangeError>) + Send + 'static,
    {
        let reader = mapping_reader(|raw: &RawResponse| {
            to_map(raw, |response| is_success_status(response))
        });
        self.dispatch(reader, Some(Box::new(callback) as Callback<_>))
    }

    fn dispatch<R>(
        self,
        reader: BodyReader<R>,
        callback: Option<Callback<R>>,
    ) -> Result<AsyncExchange<R>, ConfigurationError>
    where
        R: Send + Sync + 'static,
    {
        let (request, transport) = self.prepare()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ConfigurationError::NoAsyncRuntime)?;
        let request = Arc::new(request);
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            connect_timeout_ms = request.connection_timeout().as_millis(),
            socket_timeout_ms = request.socket_timeout().as_millis(),
            "sending non-blocking request"
        );

        let (sender, receiver) = oneshot::channel();
        let task_request = Arc::clone(&request);
        runtime.spawn(async move {
            let result = complete(transport, task_request, reader).await;
            // Resolve first so a panicking callback cannot lose the outcome.
            // The receiver is gone only when every handle was dropped.
            let _ = sender.send(result.clone());
            if let Some(callback) = callback {
                callback(result.as_ref().map(|response| &**response));
            }
        });

        let response = receiver
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(TransportError::new(
                        TransportErrorKind::Other,
                        "exchange task ended before resolving its response",
                    )
                    .into())
                })
            })
            .boxed()
            .shared();

        Ok(AsyncExchange { request, response })
    }
}

async fn complete<R>(
    transport: Arc<dyn Transport>,
    request: Arc<PreparedRequest>,
    reader: BodyReader<R>,
) -> ExchangeResult<R>
where
    R: Send + 'static,
{
    let raw = transport.execute_async(Arc::clone(&request)).await?;
    tracing::debug!(status = raw.status(), url = %request.url(), "received response");

    // Readers are synchronous and may touch the filesystem.
    let read = tokio::task::spawn_blocking(move || {
        let outcome = reader(&raw);
        (raw, outcome)
    })
    .await;
    let (raw, outcome) = match read {
        Ok(read) => read,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(error) => {
            return Err(TransportError::with_source(TransportErrorKind::Other, error).into())
        }
    };
    Ok(Arc::new(HttpResponse::from_outcome(raw, outcome?)))
}
