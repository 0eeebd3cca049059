//! Integration tests for blocking exchanges.
//!
//! The mock server runs on its own Tokio runtime; the exchanges themselves
//! are issued from the test thread, outside of any async context.

use http_exchange::{Client, ExchangeError, FileOptions, StatusLine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts a mock server hosted by `runtime`.
fn start_server(runtime: &Runtime) -> MockServer {
    runtime.block_on(MockServer::start())
}

fn mount(runtime: &Runtime, server: &MockServer, mock: Mock) {
    runtime.block_on(mock.mount(server));
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Employee {
    name: String,
    dept: String,
}

// ============================================================================
// Route and query parameters
// ============================================================================

#[test]
fn test_route_parameters_are_substituted() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/user/Henry/HR"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "Henry", "dept": "HR"})),
            ),
    );

    let exchange = Client::new()
        .get(format!("{}/user/{{name}}/{{dept}}", server.uri()))
        .route_params([("name", "Henry"), ("dept", "HR")])
        .exchange::<Employee>()
        .unwrap();

    assert_eq!(exchange.status_code(), 200);
    assert_eq!(
        exchange.body().unwrap(),
        &Employee {
            name: "Henry".to_string(),
            dept: "HR".to_string()
        }
    );
    assert_eq!(
        exchange.request().url(),
        format!("{}/user/Henry/HR", server.uri())
    );
}

#[test]
fn test_query_parameters_are_appended() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust lang"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("found")),
    );

    let exchange = Client::new()
        .get(format!("{}/search", server.uri()))
        .query_param("q", "rust lang")
        .query_param("page", 2)
        .exchange_as_string()
        .unwrap();

    assert_eq!(exchange.body().unwrap(), "found");
}

// ============================================================================
// Headers, cookies and authentication
// ============================================================================

#[test]
fn test_cookies_and_basic_auth_are_sent() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/profile"))
            .and(header("cookie", "a=1; b=2"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .and(header("x-trace", "abc"))
            .respond_with(ResponseTemplate::new(204)),
    );

    let exchange = Client::new()
        .get(format!("{}/profile", server.uri()))
        .cookie_map([
            (Some("a".to_string()), Some("1".to_string())),
            (Some("b".to_string()), Some("2".to_string())),
            (Some("dropped".to_string()), None),
        ])
        .basic_auth("user", "pass")
        .header("X-Trace", "abc")
        .exchange_empty()
        .unwrap();

    assert_eq!(exchange.status_code(), 204);
}

// ============================================================================
// Bodies
// ============================================================================

#[test]
fn test_structured_body_round_trips_to_map() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "Henry", "dept": "HR"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"name": "Henry", "dept": "HR"})),
            ),
    );

    let employee = Employee {
        name: "Henry".to_string(),
        dept: "HR".to_string(),
    };
    let exchange = Client::new()
        .post(format!("{}/echo", server.uri()))
        .body(&employee)
        .exchange_as_map()
        .unwrap();

    let map = exchange.body().unwrap();
    assert_eq!(map.get("name"), Some(&json!("Henry")));
    assert_eq!(map.get("dept"), Some(&json!("HR")));
}

#[test]
fn test_form_data_is_url_encoded() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("user=henry&note=a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome")),
    );

    let exchange = Client::new()
        .post(format!("{}/login", server.uri()))
        .form_data([("user", "henry"), ("note", "a b")])
        .exchange_as_string()
        .unwrap();

    assert_eq!(exchange.body().unwrap(), "welcome");
}

// ============================================================================
// Validation and decoding
// ============================================================================

#[test]
fn test_exchange_as_map_fails_validation_on_404() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"not found"}"#)),
    );

    let error = Client::new()
        .get(format!("{}/missing", server.uri()))
        .exchange_as_map()
        .unwrap_err();

    let validation = error.as_validation().expect("validation error");
    assert_eq!(validation.status, 404);
    assert_eq!(validation.status_text, "Not Found");
    assert_eq!(validation.detail, r#"{"error":"not found"}"#);
    assert!(error.to_string().starts_with("Response Status: 404(Not Found), Headers: {"));
}

#[test]
fn test_repeated_response_headers_reach_validation_error() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(
                ResponseTemplate::new(401)
                    .append_header("set-cookie", "a=1")
                    .append_header("set-cookie", "b=2")
                    .set_body_string("denied"),
            ),
    );

    let error = Client::new()
        .get(format!("{}/session", server.uri()))
        .exchange_as_map()
        .unwrap_err();

    let validation = error.as_validation().expect("validation error");
    assert_eq!(validation.status, 401);
    assert_eq!(validation.detail, "denied");
    assert_eq!(
        validation.headers.get("set-cookie"),
        Some(&vec!["a=1".to_string(), "b=2".to_string()])
    );
}

#[test]
fn test_undecodable_body_is_kept_on_the_response() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>")),
    );

    let exchange = Client::new()
        .get(format!("{}/html", server.uri()))
        .exchange::<Employee>()
        .unwrap();

    assert!(exchange.response_body().is_none());
    assert!(exchange.response().parsing_error().is_some());
    assert_eq!(
        exchange.response().raw().content_as_string().unwrap(),
        "<html></html>"
    );
    assert!(matches!(exchange.body(), Err(ExchangeError::Decode(_))));
}

#[test]
fn test_custom_validator_accepts_non_2xx() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("DELETE"))
            .and(path("/items/7"))
            .respond_with(ResponseTemplate::new(410).set_body_string("gone")),
    );

    let exchange = Client::new()
        .delete(format!("{}/items/{{id}}", server.uri()))
        .route_param("id", 7)
        .exchange_as_string()
        .unwrap();

    assert!(exchange.body().is_err());
    let body = exchange
        .body_with(|response| response.status() == 410)
        .unwrap();
    assert_eq!(body, "gone");
}

#[test]
fn test_exchange_with_mapper() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/count"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-total", "42")
                    .set_body_string(""),
            ),
    );

    let exchange = Client::new()
        .get(format!("{}/count", server.uri()))
        .exchange_with(|raw| Ok(raw.header("X-Total").map(str::to_string)))
        .unwrap();

    assert_eq!(exchange.body().unwrap().as_deref(), Some("42"));
}

#[test]
fn test_exchange_with_mapper_borrowing_local_state() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/greeting"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Henry")),
    );

    let prefix = String::from("Hello, ");
    let mut statuses = Vec::new();

    let exchange = Client::new()
        .get(format!("{}/greeting", server.uri()))
        .exchange_with(|raw| {
            statuses.push(raw.status());
            let name = raw.content_as_string()?;
            Ok(format!("{}{name}", prefix.as_str()))
        })
        .unwrap();

    assert_eq!(exchange.body().unwrap(), "Hello, Henry");
    assert_eq!(statuses, vec![200]);
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_exchange_as_file_writes_body() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/report.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n")),
    );

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("report.csv");
    let url = format!("{}/report.csv", server.uri());

    let exchange = Client::new()
        .get(url.clone())
        .exchange_as_file(&target, FileOptions::default())
        .unwrap();
    assert_eq!(exchange.body().unwrap(), &target);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "a,b\n1,2\n");

    let error = Client::new()
        .get(url.clone())
        .exchange_as_file(&target, FileOptions::default())
        .unwrap_err();
    assert!(matches!(error, ExchangeError::Io(_)));

    Client::new()
        .get(url)
        .exchange_as_file(&target, FileOptions::replace_existing())
        .unwrap();
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "a,b\n1,2\n");
}

// ============================================================================
// Transport failures
// ============================================================================

#[test]
fn test_connection_refused_is_a_transport_error() {
    // Reserve a free port, then close it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let error = Client::new()
        .get(format!("http://{address}/gone"))
        .connection_timeout(std::time::Duration::from_millis(500))
        .exchange_empty()
        .unwrap_err();

    assert!(matches!(error, ExchangeError::Transport(_)));
}

#[test]
fn test_socket_timeout_is_reported() {
    let runtime = Runtime::new().unwrap();
    let server = start_server(&runtime);
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)),
            ),
    );

    let error = Client::new()
        .get(format!("{}/slow", server.uri()))
        .socket_timeout(std::time::Duration::from_millis(200))
        .exchange_empty()
        .unwrap_err();

    match error {
        ExchangeError::Transport(error) => assert!(error.is_timeout()),
        other => panic!("expected transport error, got {other:?}"),
    }
}
