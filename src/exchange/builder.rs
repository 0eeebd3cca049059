//! Typed request builders.
//!
//! [`RequestBuilder`] is parameterized by a mode marker from [`mode`] that
//! decides which configuration methods exist:
//!
//! | Mode | Created by | Adds |
//! |------|------------|------|
//! | [`mode::Get`] | `get(url)` | nothing beyond the shared surface |
//! | [`mode::Modify`] | `post`, `put`, `patch`, `delete` | `content_type`, `body`, `body_text`, `form_data` |
//! | [`mode::JsonBody`] | `Modify::body` / `body_text` | `content_type` |
//! | [`mode::FormBody`] | `Modify::form_data` | `content_type` |
//!
//! Every shared method returns the same `RequestBuilder<M>` it was called on,
//! so the narrowed surface survives arbitrarily long chains. A GET builder
//! never exposes `body`.
//!
//! Configuration errors do not break the chain. The builder records the first
//! one and every exchange operation returns it before anything is sent.
//!
//! # Example
//!
//! ```rust
//! use http_exchange::Client;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let client = Client::new();
//!
//! let descriptor = client
//!     .get("http://localhost:8080/user/{name}/{dept}")
//!     .route_param("name", "Henry")
//!     .route_param("dept", "HR")
//!     .query_param("verbose", true)
//!     .socket_timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//! assert_eq!(descriptor.resolve_url().unwrap(), "http://localhost:8080/user/Henry/HR?verbose=true");
//!
//! let descriptor = client
//!     .post("http://localhost:8080/users")
//!     .header("X-Trace", "1")
//!     .body(&json!({"name": "Henry"}))
//!     .content_type("application/vnd.user+json")
//!     .build()
//!     .unwrap();
//! assert_eq!(descriptor.content_type(), Some("application/vnd.user+json"));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{header_name, header_value, BasicCredentials, ExchangeConfig, Timeout};
use crate::error::ConfigurationError;
use crate::exchange::descriptor::{
    Cookie, HttpMethod, PreparedRequest, RequestBody, RequestDescriptor, JSON_CONTENT_TYPE,
};
use crate::transport::Transport;

/// Builder mode markers.
pub mod mode {
    mod sealed {
        pub trait Sealed {}
    }

    /// Implemented by every builder mode.
    pub trait Mode: sealed::Sealed + Send + 'static {}

    /// GET requests. No body operations.
    #[derive(Debug)]
    pub enum Get {}

    /// POST, PUT, PATCH and DELETE requests before a body is chosen.
    #[derive(Debug)]
    pub enum Modify {}

    /// A body-bearing request carrying a structured or text body.
    #[derive(Debug)]
    pub enum JsonBody {}

    /// A body-bearing request carrying form fields.
    #[derive(Debug)]
    pub enum FormBody {}

    impl sealed::Sealed for Get {}
    impl sealed::Sealed for Modify {}
    impl sealed::Sealed for JsonBody {}
    impl sealed::Sealed for FormBody {}
    impl Mode for Get {}
    impl Mode for Modify {}
    impl Mode for JsonBody {}
    impl Mode for FormBody {}
}

use mode::Mode;

/// Fluent builder for one request.
///
/// A builder is consumed by its exchange operation, so a request is
/// dispatched at most once.
pub struct RequestBuilder<M: Mode> {
    descriptor: RequestDescriptor,
    error: Option<ConfigurationError>,
    transport: Arc<dyn Transport>,
    _mode: PhantomData<fn() -> M>,
}

impl<M: Mode> fmt::Debug for RequestBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("descriptor", &self.descriptor)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<M: Mode> RequestBuilder<M> {
    pub(crate) fn new(
        method: HttpMethod,
        url: String,
        config: &ExchangeConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            descriptor: RequestDescriptor::new(
                method,
                url,
                config.connection_timeout(),
                config.socket_timeout(),
                config.default_headers().clone(),
            ),
            error: None,
            transport,
            _mode: PhantomData,
        }
    }

    fn into_mode<N: Mode>(self) -> RequestBuilder<N> {
        RequestBuilder {
            descriptor: self.descriptor,
            error: self.error,
            transport: self.transport,
            _mode: PhantomData,
        }
    }

    fn record(&mut self, error: ConfigurationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Returns the descriptor as configured so far.
    #[must_use]
    pub const fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Adds route parameters substituted into `{name}` placeholders.
    ///
    /// ```rust
    /// use http_exchange::Client;
    ///
    /// let descriptor = Client::new()
    ///     .get("http://localhost:8080/user/{name}/{department}")
    ///     .route_params([("name", "Henry"), ("department", "HR")])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(descriptor.resolve_url().unwrap(), "http://localhost:8080/user/Henry/HR");
    /// ```
    #[must_use]
    pub fn route_params<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.descriptor.route_parameters.extend(
            parameters
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string())),
        );
        self
    }

    /// Adds a single route parameter.
    #[must_use]
    pub fn route_param(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.route_params([(name.into(), value.to_string())])
    }

    /// Adds query parameters appended to the URL.
    #[must_use]
    pub fn query_params<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.descriptor.query_parameters.extend(
            parameters
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string())),
        );
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query_params([(name.into(), value.to_string())])
    }

    /// Sets headers, replacing earlier values for the same names.
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            match header_name(name).and_then(|header| Ok((header, header_value(name, value)?))) {
                Ok((header, value)) => {
                    self.descriptor.headers.insert(header, value);
                }
                Err(error) => self.record(error),
            }
        }
        self
    }

    /// Sets a single header.
    #[must_use]
    pub fn header(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers([(name, value)])
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.descriptor.accept = Some(accept.into());
        self
    }

    /// Sets HTTP Basic authentication credentials.
    #[must_use]
    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.descriptor.credentials = Some(BasicCredentials::new(user, password));
        self
    }

    /// Adds cookies from name/value pairs that may be absent.
    ///
    /// Entries whose name or value is `None` are silently dropped.
    ///
    /// ```rust
    /// use http_exchange::Client;
    ///
    /// let descriptor = Client::new()
    ///     .get("http://localhost/")
    ///     .cookie_map([
    ///         (Some("session".to_string()), Some("abc".to_string())),
    ///         (Some("theme".to_string()), None),
    ///         (None, Some("orphan".to_string())),
    ///     ])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(descriptor.cookies().len(), 1);
    /// ```
    #[must_use]
    pub fn cookie_map<I, K, V>(self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Option<String>>,
        V: Into<Option<String>>,
    {
        let cookies: Vec<Cookie> = cookies
            .into_iter()
            .filter_map(|(name, value)| Some(Cookie::new(name.into()?, value.into()?)))
            .collect();
        self.cookies(cookies)
    }

    /// Adds cookies in the given order.
    #[must_use]
    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.descriptor.cookies.extend(cookies);
        self
    }

    /// Sets the connection timeout. Zero is rejected.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        match Timeout::new("connection_timeout", timeout) {
            Ok(timeout) => self.descriptor.connection_timeout = timeout,
            Err(error) => self.record(error),
        }
        self
    }

    /// Sets the socket timeout. Zero is rejected.
    #[must_use]
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        match Timeout::new("socket_timeout", timeout) {
            Ok(timeout) => self.descriptor.socket_timeout = timeout,
            Err(error) => self.record(error),
        }
        self
    }

    /// Finishes configuration, returning the descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] recorded while configuring,
    /// or the error from resolving the URL and headers.
    pub fn build(self) -> Result<RequestDescriptor, ConfigurationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.descriptor.prepare()?;
        Ok(self.descriptor)
    }

    /// Resolves the request for dispatch.
    pub(crate) fn prepare(self) -> Result<(PreparedRequest, Arc<dyn Transport>), ConfigurationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let prepared = self.descriptor.prepare()?;
        Ok((prepared, self.transport))
    }

    fn set_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.descriptor.content_type = Some(content_type.into());
        self
    }
}

impl RequestBuilder<mode::Modify> {
    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set_content_type(content_type)
    }

    /// Sets a structured body, serialized as JSON.
    ///
    /// The content type defaults to `application/json`.
    #[must_use]
    pub fn body<T: Serialize + ?Sized>(mut self, body: &T) -> RequestBuilder<mode::JsonBody> {
        match serde_json::to_value(body) {
            Ok(value) => self.descriptor.body = Some(RequestBody::Structured(value)),
            Err(error) => self.record(ConfigurationError::InvalidBody {
                reason: error.to_string(),
            }),
        }
        self.default_json_content_type().into_mode()
    }

    /// Sets a preformatted body, sent as-is.
    ///
    /// The content type defaults to `application/json`.
    #[must_use]
    pub fn body_text(mut self, body: impl Into<String>) -> RequestBuilder<mode::JsonBody> {
        self.descriptor.body = Some(RequestBody::Text(body.into()));
        self.default_json_content_type().into_mode()
    }

    /// Sets form fields, URL-encoded at dispatch.
    #[must_use]
    pub fn form_data<I, K, V>(mut self, fields: I) -> RequestBuilder<mode::FormBody>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let fields = fields
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.descriptor.body = Some(RequestBody::Form(fields));
        self.into_mode()
    }

    fn default_json_content_type(mut self) -> Self {
        if self.descriptor.content_type.is_none() {
            self.descriptor.content_type = Some(JSON_CONTENT_TYPE.to_string());
        }
        self
    }
}

impl RequestBuilder<mode::JsonBody> {
    /// Overrides the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set_content_type(content_type)
    }
}

impl RequestBuilder<mode::FormBody> {
    /// Overrides the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set_content_type(content_type)
    }
}
