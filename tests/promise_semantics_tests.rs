//! Tests for response promise semantics using in-process transports.
//!
//! These transports never touch the network, so they can count calls and
//! hold a response back indefinitely.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use http_exchange::{
    Client, ConfigurationError, ExchangeConfig, ExchangeError, PreparedRequest, RawResponse,
    StatusLine, Transport, TransportError, TransportErrorKind,
};

/// Answers every request with a fixed response and counts calls.
struct CountingTransport {
    calls: AtomicUsize,
    status: u16,
    body: &'static str,
}

impl CountingTransport {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            status,
            body,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> RawResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RawResponse::new(
            self.status,
            None,
            [("content-type", "application/json")],
            self.body,
        )
    }
}

impl Transport for CountingTransport {
    fn execute(&self, _request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        Ok(self.respond())
    }

    fn execute_async(
        &self,
        _request: Arc<PreparedRequest>,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let response = self.respond();
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(response)
        }
        .boxed()
    }
}

/// Never answers.
struct PendingTransport;

impl Transport for PendingTransport {
    fn execute(&self, _request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        Err(TransportError::new(
            TransportErrorKind::Other,
            "pending transport cannot block",
        ))
    }

    fn execute_async(
        &self,
        _request: Arc<PreparedRequest>,
    ) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        future::pending().boxed()
    }
}

fn client_with(transport: Arc<dyn Transport>) -> Client {
    Client::with_transport(ExchangeConfig::default(), transport)
}

// ============================================================================
// Exactly-once resolution
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_every_continuation_sees_the_same_single_response() {
    let transport = CountingTransport::new(200, r#"{"id":1}"#);
    let client = client_with(transport.clone());

    let exchange = client
        .get("http://localhost/items/1")
        .exchange_as_map_async()
        .unwrap();

    let continuations: Vec<_> = (0..8)
        .map(|_| {
            let exchange = exchange.clone();
            tokio::spawn(async move { exchange.body().await })
        })
        .collect();

    for continuation in continuations {
        let body = continuation.await.unwrap().unwrap();
        assert_eq!(body.get("id"), Some(&serde_json::json!(1)));
    }

    let first = exchange.response().await.unwrap();
    let second = exchange.response().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_callback_runs_once_even_with_many_consumers() {
    let transport = CountingTransport::new(201, "created");
    let client = client_with(transport.clone());
    let callbacks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&callbacks);

    let exchange = client
        .post("http://localhost/items")
        .body_text("{}")
        .exchange_as_string_async_with_callback(move |result| {
            assert_eq!(result.unwrap().status(), 201);
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    for _ in 0..3 {
        assert_eq!(exchange.body().await.unwrap(), "created");
    }
    assert_eq!(callbacks.load(Ordering::SeqCst), 1);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_panicking_callback_keeps_the_response() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport.clone());

    let exchange = client
        .get("http://localhost/")
        .exchange_as_string_async_with_callback(|_| panic!("callback failed"))
        .unwrap();

    let response = exchange.response().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(exchange.body().await.unwrap(), "ok");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_rejected_body_reports_validation_for_every_consumer() {
    let transport = CountingTransport::new(404, r#"{"error":"not found"}"#);
    let client = client_with(transport.clone());

    let exchange = client
        .get("http://localhost/missing")
        .exchange_as_string_async()
        .unwrap();

    for _ in 0..2 {
        let error = exchange.body().await.unwrap_err();
        let validation = error.as_validation().unwrap();
        assert_eq!(validation.status, 404);
        assert_eq!(validation.detail, r#"{"error":"not found"}"#);
    }
    assert_eq!(transport.calls(), 1);
}

// ============================================================================
// Pending responses
// ============================================================================

#[tokio::test]
async fn test_unanswered_exchange_stays_pending() {
    let client = client_with(Arc::new(PendingTransport));

    let exchange = client
        .get("http://localhost/slow")
        .exchange_as_string_async()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(exchange.try_response().is_none());

    let timed_out = tokio::time::timeout(Duration::from_millis(50), exchange.body()).await;
    assert!(timed_out.is_err());
}

#[tokio::test]
async fn test_try_response_is_available_after_resolution() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport);

    let exchange = client
        .get("http://localhost/")
        .exchange_as_string_async()
        .unwrap();

    exchange.response().await.unwrap();
    let resolved = exchange.try_response().expect("resolved");
    assert_eq!(resolved.unwrap().body(), Some(&"ok".to_string()));
}

// ============================================================================
// Configuration failures
// ============================================================================

#[tokio::test]
async fn test_zero_connection_timeout_never_reaches_transport() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport.clone());

    let result = client
        .get("http://localhost/")
        .connection_timeout(Duration::ZERO)
        .exchange_as_string_async();

    assert!(matches!(
        result,
        Err(ConfigurationError::ZeroTimeout {
            field: "connection_timeout"
        })
    ));

    let blocking = client
        .get("http://localhost/")
        .socket_timeout(Duration::ZERO)
        .exchange_as_string();
    assert!(matches!(blocking, Err(ExchangeError::Configuration(_))));

    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_missing_route_parameter_never_reaches_transport() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport.clone());

    let result = client
        .get("http://localhost/user/{name}/{dept}")
        .route_param("name", "Henry")
        .exchange_as_map();

    assert!(matches!(
        result,
        Err(ExchangeError::Configuration(ConfigurationError::MissingRouteParameter { ref name }))
            if name == "dept"
    ));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_async_exchange_requires_runtime() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport.clone());

    let result = client.get("http://localhost/").exchange_empty_async();

    assert!(matches!(result, Err(ConfigurationError::NoAsyncRuntime)));
    assert_eq!(transport.calls(), 0);
}

// ============================================================================
// Blocking through the same transport
// ============================================================================

#[test]
fn test_blocking_and_async_report_the_same_validation_error() {
    let transport = CountingTransport::new(404, r#"{"error":"not found"}"#);
    let client = client_with(transport);

    let blocking = client
        .get("http://localhost/missing")
        .exchange_as_string()
        .unwrap();
    let blocking_error = blocking.body().unwrap_err();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let async_error = runtime.block_on(async {
        client
            .get("http://localhost/missing")
            .exchange_as_string_async()
            .unwrap()
            .body()
            .await
            .unwrap_err()
    });

    assert_eq!(blocking_error.to_string(), async_error.to_string());
    assert_eq!(blocking_error.as_validation(), async_error.as_validation());
}

#[test]
fn test_sent_request_keeps_the_configured_values() {
    let transport = CountingTransport::new(200, "{}");
    let client = client_with(transport);

    let exchange = client
        .get("http://localhost/user/{name}/{dept}")
        .route_params([("name", "Henry"), ("dept", "HR")])
        .query_param("verbose", true)
        .header("X-Trace", "abc")
        .exchange_as_map()
        .unwrap();

    let descriptor = exchange.request().descriptor();
    assert_eq!(
        descriptor.route_parameters(),
        &[
            ("name".to_string(), "Henry".to_string()),
            ("dept".to_string(), "HR".to_string())
        ]
    );
    assert_eq!(
        descriptor.query_parameters(),
        &[("verbose".to_string(), "true".to_string())]
    );
    assert_eq!(exchange.request().header("x-trace"), Some("abc"));
    assert_eq!(
        exchange.request().url(),
        "http://localhost/user/Henry/HR?verbose=true"
    );
}

// ============================================================================
// Deprecated blocking wait
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(deprecated)]
async fn test_wait_response_returns_the_cached_outcome() {
    let transport = CountingTransport::new(200, "ok");
    let client = client_with(transport.clone());

    let exchange = client
        .get("http://localhost/")
        .exchange_as_string_async()
        .unwrap();

    let waited = tokio::task::spawn_blocking(move || {
        let first = exchange.wait_response().unwrap();
        let second = exchange.wait_response().unwrap();
        (first, second)
    })
    .await
    .unwrap();

    assert!(Arc::ptr_eq(&waited.0, &waited.1));
    assert_eq!(waited.0.body(), Some(&"ok".to_string()));
    assert_eq!(transport.calls(), 1);
}
