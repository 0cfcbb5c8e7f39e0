//! API key handling
//!
//! The admin API key arrives on an inbound header and, on the edge role, is
//! copied onto the downstream request. In between it lives in a
//! [`SecretString`]: zeroed on drop and redacted in `Debug` output, so an
//! `ExportRequest` can be logged with `?` safely.

use secrecy::{CloneableSecret, DebugSecret, Secret};
use zeroize::Zeroize;

/// Raw key bytes, zeroed on drop
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl SecretValue {
    /// Borrow the raw value, for writing into an outbound header
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// API key held in memory; read with `expose_secret()`
pub type SecretString = Secret<SecretValue>;

/// Wrap a key
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Key from an inbound header value
///
/// A missing or blank header carries no credential and yields `None`, so
/// nothing is forwarded downstream.
///
/// ```rust
/// use sitepack::config::api_key_from_header;
///
/// assert!(api_key_from_header(Some("admin-key")).is_some());
/// assert!(api_key_from_header(Some("  ")).is_none());
/// assert!(api_key_from_header(None).is_none());
/// ```
pub fn api_key_from_header(value: Option<&str>) -> Option<SecretString> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| secret_string(v.to_string()))
}
