//! Request descriptors.
//!
//! A [`RequestDescriptor`] records everything a builder was told about a
//! request. Dispatch turns it into a [`PreparedRequest`]: route placeholders
//! substituted, query string appended and every header resolved.

use std::fmt;

use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE,
};

use crate::config::{header_value, BasicCredentials, Timeout};
use crate::error::ConfigurationError;

/// Media type used for structured bodies unless overridden.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Media type used for form bodies unless overridden.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP methods supported by the request builders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP PATCH method.
    Patch,
    /// HTTP DELETE method.
    Delete,
}

impl HttpMethod {
    /// Returns the upper-case method token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// A request cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Creates a new cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// The payload of a body-bearing request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// A structured value, serialized as JSON at dispatch.
    Structured(serde_json::Value),
    /// A preformatted text payload, sent as-is.
    Text(String),
    /// Form fields, URL-encoded at dispatch.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    fn default_content_type(&self) -> &'static str {
        match self {
            Self::Structured(_) | Self::Text(_) => JSON_CONTENT_TYPE,
            Self::Form(_) => FORM_CONTENT_TYPE,
        }
    }

    fn to_bytes(&self) -> Bytes {
        match self {
            Self::Structured(value) => Bytes::from(value.to_string()),
            Self::Text(text) => Bytes::from(text.clone()),
            Self::Form(fields) => Bytes::from(encode_pairs(fields)),
        }
    }
}

/// Everything known about a request before it is dispatched.
///
/// Descriptors are only mutated by their builder. Once a builder hands its
/// descriptor to an exchange, nothing changes it again.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) route_parameters: Vec<(String, String)>,
    pub(crate) query_parameters: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) credentials: Option<BasicCredentials>,
    pub(crate) connection_timeout: Timeout,
    pub(crate) socket_timeout: Timeout,
    pub(crate) body: Option<RequestBody>,
    pub(crate) content_type: Option<String>,
    pub(crate) accept: Option<String>,
}

impl RequestDescriptor {
    pub(crate) fn new(
        method: HttpMethod,
        url: String,
        connection_timeout: Timeout,
        socket_timeout: Timeout,
        headers: HeaderMap,
    ) -> Self {
        Self {
            method,
            url,
            route_parameters: Vec::new(),
            query_parameters: Vec::new(),
            headers,
            cookies: Vec::new(),
            credentials: None,
            connection_timeout,
            socket_timeout,
            body: None,
            content_type: None,
            accept: None,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the URL template, placeholders included.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the route parameters in the order they were supplied.
    #[must_use]
    pub fn route_parameters(&self) -> &[(String, String)] {
        &self.route_parameters
    }

    /// Returns the query parameters in the order they were supplied.
    #[must_use]
    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query_parameters
    }

    /// Returns the explicitly configured headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the cookies in the order they were supplied.
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Returns the Basic authentication credentials, if set.
    #[must_use]
    pub const fn credentials(&self) -> Option<&BasicCredentials> {
        self.credentials.as_ref()
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Timeout {
        self.connection_timeout
    }

    /// Returns the socket timeout.
    #[must_use]
    pub const fn socket_timeout(&self) -> Timeout {
        self.socket_timeout
    }

    /// Returns the request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns the explicit content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the explicit `Accept` value, if set.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Substitutes route parameters into the URL template and appends the
    /// query string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingRouteParameter`] when a placeholder
    /// has no value, or [`ConfigurationError::InvalidUrl`] when the template is
    /// empty or has an unterminated placeholder.
    pub fn resolve_url(&self) -> Result<String, ConfigurationError> {
        let mut url = substitute_route(&self.url, &self.route_parameters)?;
        if !self.query_parameters.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encode_pairs(&self.query_parameters));
        }
        Ok(url)
    }

    /// Resolves the descriptor into the form handed to a transport.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the URL cannot be resolved or a
    /// header value cannot be sent.
    pub fn prepare(&self) -> Result<PreparedRequest, ConfigurationError> {
        let url = self.resolve_url()?;

        let mut headers = self.headers.clone();
        if let Some(accept) = &self.accept {
            headers.insert(ACCEPT, header_value("accept", accept)?);
        }
        if let Some(credentials) = &self.credentials {
            headers.insert(
                AUTHORIZATION,
                header_value("authorization", &credentials.header_value())?,
            );
        }
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, header_value("cookie", &cookie)?);
        }

        let body = self.body.as_ref().map(RequestBody::to_bytes);
        let content_type = self
            .content_type
            .as_deref()
            .or_else(|| self.body.as_ref().map(RequestBody::default_content_type));
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, header_value("content-type", content_type)?);
        }

        Ok(PreparedRequest {
            descriptor: self.clone(),
            url,
            headers,
            body,
        })
    }
}

/// A fully resolved request, ready for a transport.
///
/// Kept by exchange results for diagnostics.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    descriptor: RequestDescriptor,
    url: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl PreparedRequest {
    /// Returns the descriptor this request was prepared from.
    #[must_use]
    pub const fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.descriptor.method
    }

    /// Returns the resolved URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns every header that will be sent.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the encoded body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Timeout {
        self.descriptor.connection_timeout
    }

    /// Returns the socket timeout.
    #[must_use]
    pub const fn socket_timeout(&self) -> Timeout {
        self.descriptor.socket_timeout
    }

    /// Returns the value of a header as text, if present and printable.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value: &HeaderValue| value.to_str().ok())
    }
}

fn substitute_route(
    template: &str,
    parameters: &[(String, String)],
) -> Result<String, ConfigurationError> {
    if template.is_empty() {
        return Err(ConfigurationError::InvalidUrl {
            url: template.to_string(),
        });
    }

    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| ConfigurationError::InvalidUrl {
            url: template.to_string(),
        })?;
        let name = &after[..end];
        // Later values win, matching map semantics.
        let value = parameters
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| ConfigurationError::MissingRouteParameter {
                name: name.to_string(),
            })?;
        result.push_str(&urlencoding::encode(value));
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestDescriptor>();
    assert_send_sync::<PreparedRequest>();
};
