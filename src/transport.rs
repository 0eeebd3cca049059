//! HTTP transports.
//!
//! The exchange layer only shapes requests and interprets responses. Sending
//! bytes over the network is delegated to a [`Transport`]. Connection
//! pooling, TLS and retries are the transport's business.
//!
//! [`ReqwestTransport`] is the default implementation. Tests and embedders can
//! supply their own.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::RwLock;

use crate::exchange::{PreparedRequest, RawResponse, TransportError};

/// Issues HTTP requests.
///
/// Implementations must honour the request's connection and socket
/// timeouts; no other bound is applied to a call.
pub trait Transport: Send + Sync {
    /// Sends `request` and blocks until the response has been read.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the call fails or times out.
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;

    /// Sends `request` without blocking the caller.
    fn execute_async(
        &self,
        request: Arc<PreparedRequest>,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>>;
}

/// A [`Transport`] backed by `reqwest`.
///
/// Connect timeouts are a client-level setting in reqwest. Async clients are
/// built once per connect timeout and reused, so connections are pooled
/// across calls. The socket timeout is applied per request.
///
/// Blocking clients are built for every call: each one owns a runtime thread
/// and must not be dropped from inside an async context, which a shared
/// transport cannot guarantee.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    async_clients: RwLock<HashMap<Duration, reqwest::Client>>,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates the transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the async client for `connect_timeout`, building it on first use.
    fn async_client(&self, connect_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
        if let Some(client) = self.async_clients.read().get(&connect_timeout) {
            return Ok(client.clone());
        }
        let mut clients = self.async_clients.write();
        if let Some(client) = clients.get(&connect_timeout) {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(connect_timeout)
            .build()?;
        clients.insert(connect_timeout, client.clone());
        Ok(client)
    }

    /// Parses response headers into a lowercase-keyed multimap.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> BTreeMap<String, Vec<String>> {
        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn raw_response(
        status: reqwest::StatusCode,
        headers: &reqwest::header::HeaderMap,
        body: bytes::Bytes,
    ) -> RawResponse {
        let headers = Self::parse_response_headers(headers)
            .into_iter()
            .flat_map(|(name, values)| values.into_iter().map(move |value| (name.clone(), value)));
        RawResponse::new(
            status.as_u16(),
            status.canonical_reason().map(String::from),
            headers,
            body,
        )
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .use_rustls_tls()
            .connect_timeout(request.connection_timeout().as_duration())
            .timeout(request.socket_timeout().as_duration())
            .build()?;

        let mut builder = client
            .request(request.method().into(), request.url())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;
        Ok(Self::raw_response(status, &headers, body))
    }

    fn execute_async(
        &self,
        request: Arc<PreparedRequest>,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let client = match self.async_client(request.connection_timeout().as_duration()) {
            Ok(client) => client,
            Err(error) => return future::ready(Err(error.into())).boxed(),
        };

        async move {
            let mut builder = client
                .request(request.method().into(), request.url())
                .timeout(request.socket_timeout().as_duration())
                .headers(request.headers().clone());
            if let Some(body) = request.body() {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok(Self::raw_response(status, &headers, body))
        }
        .boxed()
    }
}
