use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TokenSigner;
use crate::error::{Error, Result};
use crate::types::ResourceActions;

/// Lifetime of every issued token.
pub const TOKEN_TTL_SECS: i64 = 30 * 60;

/// Registry bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub jti: String,
    pub access: Vec<ResourceActions>,
}

/// Body of a successful token response. The token is repeated under
/// `access_token` for OAuth2-style clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub access_token: String,
    pub expires_in: i64,
    pub issued_at: String,
}

pub struct TokenIssuer {
    issuer: String,
    signer: Arc<dyn TokenSigner>,
}

impl TokenIssuer {
    pub fn new(issuer: impl Into<String>, signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            issuer: issuer.into(),
            signer,
        }
    }

    /// Signs a token for `subject` (empty for anonymous) carrying `granted`.
    /// Fails with `ServiceMismatch` before signing when the requested
    /// service is not the one this issuer serves.
    pub fn issue(
        &self,
        subject: &str,
        granted: Vec<ResourceActions>,
        requested_service: &str,
        expected_service: &str,
    ) -> Result<TokenResponse> {
        if requested_service != expected_service {
            return Err(Error::ServiceMismatch {
                requested: requested_service.to_string(),
                expected: expected_service.to_string(),
            });
        }

        let now = Utc::now();
        let issued_at = now.timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            aud: vec![expected_service.to_string()],
            exp: issued_at + TOKEN_TTL_SECS,
            nbf: issued_at,
            iat: issued_at,
            jti: Uuid::new_v4().to_string(),
            access: granted,
        };

        let token = self.signer.sign(&claims)?;

        tracing::info!(
            subject = %claims.sub,
            service = %expected_service,
            grants = claims.access.len(),
            jti = %claims.jti,
            "Issued token"
        );

        Ok(TokenResponse {
            access_token: token.clone(),
            token,
            expires_in: TOKEN_TTL_SECS,
            issued_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}
