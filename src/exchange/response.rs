//! Response types for request exchanges.
//!
//! A transport produces a [`RawResponse`]. Each exchange operation then reads
//! the raw body into its own shape, producing an [`HttpResponse<R>`].

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::exchange::errors::{DecodeError, ExchangeError, IoError};

/// Anything that carries an HTTP status code.
pub trait StatusLine {
    /// Returns the HTTP status code.
    fn status(&self) -> u16;
}

/// A response exactly as the transport returned it.
///
/// Header names are stored lowercase; a header may have several values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    status_text: String,
    headers: BTreeMap<String, Vec<String>>,
    body: Bytes,
}

impl RawResponse {
    /// Creates a raw response.
    ///
    /// Header names are lowercased. The status text defaults to the
    /// canonical reason phrase when `status_text` is `None`.
    #[must_use]
    pub fn new<I, K, V>(
        status: u16,
        status_text: Option<String>,
        headers: I,
        body: impl Into<Bytes>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut parsed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            parsed
                .entry(name.as_ref().to_lowercase())
                .or_default()
                .push(value.into());
        }
        let status_text = status_text.unwrap_or_else(|| canonical_reason(status).to_string());
        Self {
            status,
            status_text,
            headers: parsed,
            body: body.into(),
        }
    }

    /// Returns the status reason phrase.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Returns all response headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body decoded as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the body is not valid UTF-8.
    pub fn content_as_string(&self) -> Result<String, DecodeError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| DecodeError::new(format!("response body is not valid UTF-8: {e}")))
    }
}

impl StatusLine for RawResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

/// A response whose body has been read into `R`.
///
/// When a decoding reader fails, `body` is `None` and the failure is kept in
/// `parsing_error`; the raw body stays available either way.
#[derive(Clone, Debug)]
pub struct HttpResponse<R> {
    raw: RawResponse,
    body: Option<R>,
    parsing_error: Option<DecodeError>,
}

impl<R> HttpResponse<R> {
    pub(crate) fn from_outcome(raw: RawResponse, outcome: BodyOutcome<R>) -> Self {
        match outcome {
            BodyOutcome::Parsed(body) => Self {
                raw,
                body: Some(body),
                parsing_error: None,
            },
            BodyOutcome::Unparsed(error) => Self {
                raw,
                body: None,
                parsing_error: Some(error),
            },
        }
    }

    /// Returns the status reason phrase.
    #[must_use]
    pub fn status_text(&self) -> &str {
        self.raw.status_text()
    }

    /// Returns all response headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        self.raw.headers()
    }

    /// Returns the decoded body, if decoding succeeded.
    #[must_use]
    pub const fn body(&self) -> Option<&R> {
        self.body.as_ref()
    }

    /// Consumes the response, returning the decoded body.
    #[must_use]
    pub fn into_body(self) -> Option<R> {
        self.body
    }

    /// Returns the decoding failure, if any.
    #[must_use]
    pub const fn parsing_error(&self) -> Option<&DecodeError> {
        self.parsing_error.as_ref()
    }

    /// Returns the response as the transport returned it.
    #[must_use]
    pub const fn raw(&self) -> &RawResponse {
        &self.raw
    }
}

impl<R> StatusLine for HttpResponse<R> {
    fn status(&self) -> u16 {
        self.raw.status
    }
}

/// How to treat an existing file when downloading a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Overwrite the target if it already exists.
    pub replace_existing: bool,
}

impl FileOptions {
    /// Options that overwrite an existing target.
    #[must_use]
    pub const fn replace_existing() -> Self {
        Self {
            replace_existing: true,
        }
    }
}

/// Result of reading a raw body.
#[derive(Debug)]
pub(crate) enum BodyOutcome<R> {
    Parsed(R),
    Unparsed(DecodeError),
}

/// Reads a raw response into a body. An `Err` fails the whole exchange.
pub(crate) type BodyReader<R> =
    Box<dyn FnOnce(&RawResponse) -> Result<BodyOutcome<R>, ExchangeError> + Send>;

pub(crate) fn empty_reader() -> BodyReader<()> {
    Box::new(|_: &RawResponse| Ok(BodyOutcome::Parsed(())))
}

pub(crate) fn string_reader() -> BodyReader<String> {
    Box::new(|raw: &RawResponse| {
        Ok(match raw.content_as_string() {
            Ok(text) => BodyOutcome::Parsed(text),
            Err(error) => BodyOutcome::Unparsed(error),
        })
    })
}

pub(crate) fn object_reader<T: DeserializeOwned + 'static>() -> BodyReader<T> {
    Box::new(|raw: &RawResponse| {
        Ok(match serde_json::from_slice::<T>(raw.body()) {
            Ok(value) => BodyOutcome::Parsed(value),
            Err(error) => BodyOutcome::Unparsed(DecodeError::from(error)),
        })
    })
}

pub(crate) fn mapping_reader<R, F>(mapper: F) -> BodyReader<R>
where
    R: 'static,
    F: FnOnce(&RawResponse) -> Result<R, ExchangeError> + Send + 'static,
{
    Box::new(|raw: &RawResponse| mapper(raw).map(BodyOutcome::Parsed))
}

pub(crate) fn file_reader(path: PathBuf, options: FileOptions) -> BodyReader<PathBuf> {
    Box::new(move |raw: &RawResponse| {
        write_body(&path, raw.body(), options)
            .map_err(|e| ExchangeError::Io(IoError::new(path.display().to_string(), e)))?;
        Ok(BodyOutcome::Parsed(path))
    })
}

fn write_body(path: &Path, body: &[u8], options: FileOptions) -> std::io::Result<()> {
    let mut file = if options.replace_existing {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?
    } else {
        OpenOptions::new().write(true).create_new(true).open(path)?
    };
    file.write_all(body)?;
    file.flush()
}

fn canonical_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}
