//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers that validate their contents on
//! construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigurationError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::time::Duration;

/// A validated, non-zero timeout.
///
/// `Duration` cannot be negative, so the only rejected value is zero.
///
/// # Example
///
/// ```rust
/// use http_exchange::Timeout;
/// use std::time::Duration;
///
/// let timeout = Timeout::new("socket_timeout", Duration::from_secs(30)).unwrap();
/// assert_eq!(timeout.as_duration(), Duration::from_secs(30));
/// assert_eq!(timeout.as_millis(), 30_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timeout(Duration);

impl Timeout {
    /// Creates a new validated timeout.
    ///
    /// `field` names the setting and is only used in the error message.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroTimeout`] if `duration` is zero.
    pub const fn new(field: &'static str, duration: Duration) -> Result<Self, ConfigurationError> {
        if duration.is_zero() {
            return Err(ConfigurationError::ZeroTimeout { field });
        }
        Ok(Self(duration))
    }

    /// Default connection timeout (5 seconds).
    #[must_use]
    pub const fn default_connection() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Default socket timeout (30 seconds).
    #[must_use]
    pub const fn default_socket() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Returns the wrapped duration.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Returns the timeout in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn as_millis(&self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Credentials for HTTP Basic authentication.
///
/// # Security
///
/// The `Debug` implementation masks the password, displaying only the user
/// name.
///
/// # Example
///
/// ```rust
/// use http_exchange::BasicCredentials;
///
/// let credentials = BasicCredentials::new("Aladdin", "open sesame");
/// assert_eq!(credentials.header_value(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
/// assert_eq!(
///     format!("{credentials:?}"),
///     r#"BasicCredentials { user: "Aladdin", password: ***** }"#
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    user: String,
    password: String,
}

impl BasicCredentials {
    /// Creates a new credential pair.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Returns the user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the `Authorization` header value for these credentials.
    #[must_use]
    pub fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BasicCredentials {{ user: {:?}, password: ***** }}",
            self.user
        )
    }
}

// Verify newtypes are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Timeout>();
    assert_send_sync::<BasicCredentials>();
};
