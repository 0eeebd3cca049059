//! Response validation and interpretation shared by both exchange modes.
//!
//! Blocking and non-blocking exchanges call the same functions here, so a
//! response fails validation, and produces the same error text, regardless of
//! how it was fetched.

use serde_json::{Map, Value};

use crate::exchange::errors::{DecodeError, ExchangeError, ValidationError};
use crate::exchange::response::{HttpResponse, RawResponse, StatusLine};

/// Returns `true` iff the status code is in the 2xx class.
///
/// # Example
///
/// ```rust
/// use http_exchange::{is_success_status, RawResponse};
///
/// let ok = RawResponse::new(204, None, Vec::<(String, String)>::new(), "");
/// let missing = RawResponse::new(404, None, Vec::<(String, String)>::new(), "");
/// assert!(is_success_status(&ok));
/// assert!(!is_success_status(&missing));
/// ```
pub fn is_success_status<S: StatusLine + ?Sized>(response: &S) -> bool {
    response.status() / 100 == 2
}

/// Validates a raw response and decodes its body as a JSON object.
///
/// # Errors
///
/// Returns [`ExchangeError::Validation`] when `validator` rejects the response
/// (the detail is the raw body text, or empty if it cannot be read) and
/// [`ExchangeError::Decode`] when the body is not a JSON object.
pub fn to_map<F>(response: &RawResponse, validator: F) -> Result<Map<String, Value>, ExchangeError>
where
    F: Fn(&RawResponse) -> bool,
{
    if !validator(response) {
        let detail = response.content_as_string().unwrap_or_default();
        return Err(validation_error(response, detail).into());
    }
    let map = serde_json::from_slice::<Map<String, Value>>(response.body())
        .map_err(DecodeError::from)?;
    Ok(map)
}

/// Validates a read response and returns its body.
///
/// # Errors
///
/// Returns [`ExchangeError::Validation`] when `validator` rejects the response;
/// the detail is the body decoding failure if there was one, otherwise the raw
/// body text. Returns [`ExchangeError::Decode`] when the response passed
/// validation but its body could not be decoded.
pub fn validated_body<R, F>(response: &HttpResponse<R>, validator: F) -> Result<&R, ExchangeError>
where
    F: FnOnce(&HttpResponse<R>) -> bool,
{
    if !validator(response) {
        let detail = response.parsing_error().map_or_else(
            || response.raw().content_as_string().unwrap_or_default(),
            |error| error.message.clone(),
        );
        return Err(validation_error(response.raw(), detail).into());
    }
    match (response.body(), response.parsing_error()) {
        (Some(body), _) => Ok(body),
        (None, Some(error)) => Err(error.clone().into()),
        (None, None) => Err(DecodeError::new("response has no body").into()),
    }
}

fn validation_error(response: &RawResponse, detail: String) -> ValidationError {
    tracing::debug!(
        status = response.status(),
        "response failed validation"
    );
    ValidationError {
        status: response.status(),
        status_text: response.status_text().to_string(),
        headers: response.headers().clone(),
        detail,
    }
}
