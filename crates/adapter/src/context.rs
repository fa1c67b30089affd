//! Connection context
//!
//! Resolved once at connect time. Missing credentials put the connection in
//! the [`AuthState::Anonymous`] state, in which every data-bearing
//! operation returns an empty result without touching the network.

use crate::config::{DatabaseConfig, ServerConfig};
use crate::credentials::{ApiToken, encode_token};

/// Whether requests can be authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No usable credentials
    Anonymous,
    /// Credentials encoded and ready to send
    Authenticated(ApiToken),
}

/// Immutable per-connection state
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    auth: AuthState,
    product: Option<String>,
}

impl ConnectionContext {
    /// Resolve credentials and default product from host configuration
    pub fn new(server: &ServerConfig, database: &DatabaseConfig) -> Self {
        let auth = match encode_token(server.user.as_deref(), server.password.as_deref()) {
            Some(token) => AuthState::Authenticated(token),
            None => AuthState::Anonymous,
        };
        Self {
            auth,
            product: database.database.clone().filter(|p| !p.is_empty()),
        }
    }

    /// Context with a pre-encoded token
    pub fn authenticated(token: ApiToken, product: Option<String>) -> Self {
        Self {
            auth: AuthState::Authenticated(token),
            product,
        }
    }

    /// Context without credentials
    pub fn anonymous() -> Self {
        Self {
            auth: AuthState::Anonymous,
            product: None,
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Token, if authenticated
    pub fn token(&self) -> Option<&ApiToken> {
        match &self.auth {
            AuthState::Authenticated(token) => Some(token),
            AuthState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    /// Default product (database) for this connection
    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_with_credentials() {
        let server = ServerConfig::with_credentials("key", "secret");
        let ctx = ConnectionContext::new(&server, &DatabaseConfig::product("12"));

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.token(), encode_token(Some("key"), Some("secret")).as_ref());
        assert_eq!(ctx.product(), Some("12"));
    }

    #[test]
    fn test_context_without_password_is_anonymous() {
        let server = ServerConfig {
            user: Some("key".into()),
            ..Default::default()
        };
        let ctx = ConnectionContext::new(&server, &DatabaseConfig::default());

        assert_eq!(ctx.auth(), &AuthState::Anonymous);
        assert!(ctx.token().is_none());
        assert!(ctx.product().is_none());
    }

    #[test]
    fn test_empty_product_is_none() {
        let ctx = ConnectionContext::new(&ServerConfig::default(), &DatabaseConfig::product(""));
        assert!(ctx.product().is_none());
    }
}
