use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::server::AppState;
use crate::server::response::RegistryError;

/// Username and secret presented via HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Decodes a `Basic base64(username:secret)` header value.
pub fn parse_basic_auth(header: &str) -> Option<BasicCredentials> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, secret) = credentials.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        secret: secret.to_string(),
    })
}

/// Extractor for optional Basic credentials.
/// Absent header means an anonymous caller; a malformed or non-Basic header is rejected.
pub struct BasicAuth(pub Option<BasicCredentials>);

impl FromRequestParts<Arc<AppState>> for BasicAuth {
    type Rejection = RegistryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(BasicAuth(None));
        };

        header
            .to_str()
            .ok()
            .and_then(parse_basic_auth)
            .map(|creds| BasicAuth(Some(creds)))
            .ok_or_else(|| {
                tracing::warn!("Rejected malformed authorization header");
                RegistryError::unauthorized(&state.config.auth.realm)
            })
    }
}
