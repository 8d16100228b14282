//! HTTP Basic authentication middleware.

use crate::extractors::Principal;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use catalog_config::AuthConfig;
use catalog_core::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves credentials to a request principal.
pub trait Authenticator: Send + Sync {
    /// Returns the principal for valid credentials.
    fn authenticate(&self, username: &str, password: &str) -> Option<Principal>;
}

/// Authenticator over a fixed set of configured accounts.
#[derive(Debug, Clone, Default)]
pub struct BasicAuthenticator {
    accounts: HashMap<String, (String, UserId)>,
}

impl BasicAuthenticator {
    /// Creates an authenticator from the configured accounts.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let accounts = config
            .accounts
            .iter()
            .map(|account| {
                (
                    account.username.clone(),
                    (account.password.clone(), UserId(account.user_id)),
                )
            })
            .collect();
        Self { accounts }
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        let (expected, user_id) = self.accounts.get(username)?;
        constant_time_eq(expected.as_bytes(), password.as_bytes()).then(|| Principal::new(*user_id))
    }
}

/// Compares two byte strings in time independent of where they differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authentication middleware state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub authenticator: Arc<dyn Authenticator>,
}

impl AuthMiddlewareState {
    /// Creates the middleware state.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

/// Extracts `username:password` from a Basic authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Authentication middleware for HTTP Basic credentials.
///
/// Valid credentials add a [`Principal`] to the request extensions. The
/// request is never rejected here; handlers that need a caller extract
/// the principal and fail with 401 when it is absent.
pub async fn basic_auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some((username, password)) = basic_credentials(request.headers()) {
        match state.authenticator.authenticate(&username, &password) {
            Some(principal) => {
                debug!(user_id = %principal.user_id, "Authenticated request");
                request.extensions_mut().insert(principal);
            }
            None => debug!(username = %username, "Basic credentials rejected"),
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials_decoded() {
        let headers = header(&format!("Basic {}", STANDARD.encode("admin:pass:word")));
        assert_eq!(
            basic_credentials(&headers),
            Some(("admin".to_string(), "pass:word".to_string()))
        );
    }

    #[test]
    fn test_non_basic_scheme_ignored() {
        assert_eq!(basic_credentials(&header("Bearer token")), None);
        assert_eq!(basic_credentials(&header("Basic !!!")), None);
        assert_eq!(basic_credentials(&HeaderMap::new()), None);
    }

    #[test]
    fn test_default_account() {
        let authenticator = BasicAuthenticator::from_config(&AuthConfig::default());
        assert_eq!(
            authenticator.authenticate("admin", "password"),
            Some(Principal::new(UserId(1)))
        );
        assert_eq!(authenticator.authenticate("admin", "wrong"), None);
        assert_eq!(authenticator.authenticate("nobody", "password"), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"password", b"password"));
        assert!(!constant_time_eq(b"password", b"passwore"));
        assert!(!constant_time_eq(b"password", b"password1"));
        assert!(!constant_time_eq(b"password", b""));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_password_prefix_rejected() {
        let authenticator = BasicAuthenticator::from_config(&AuthConfig::default());
        assert_eq!(authenticator.authenticate("admin", "pass"), None);
        assert_eq!(authenticator.authenticate("admin", "password "), None);
        assert_eq!(authenticator.authenticate("admin", ""), None);
    }
}
