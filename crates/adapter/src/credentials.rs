//! Credential encoding for the query API
//!
//! The query API authenticates every request with HTTP Basic auth. The
//! token is computed once per connection and reused for every request.

use base64::{Engine as _, engine::general_purpose};

/// Pre-encoded HTTP Basic credentials (`base64(user:password)`)
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap an already-encoded token
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The encoded token, without the `Basic ` prefix
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Encode a username/password pair into a reusable token
///
/// Returns `None` when either credential is missing or empty; callers treat
/// that as anonymous mode rather than an error.
pub fn encode_token(user: Option<&str>, password: Option<&str>) -> Option<ApiToken> {
    match (user, password) {
        (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
            let credentials = format!("{}:{}", user, password);
            Some(ApiToken(general_purpose::STANDARD.encode(credentials.as_bytes())))
        }
        _ => None,
    }
}
