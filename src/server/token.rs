use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, Query, Request, State},
    http::HeaderMap,
};

use super::AppState;
use super::response::RegistryError;
use crate::auth::{
    BasicAuth, BasicCredentials, authenticate, authenticate_password, looks_like_token,
};
use crate::authz::authorize_access;
use crate::error::{Error, Result};
use crate::token::{TokenResponse, parse_scopes};
use crate::types::{AccessCredential, User};

/// A decoded `GET /token` request.
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    pub service: String,
    pub scopes: Vec<String>,
    pub credentials: Option<BasicCredentials>,
    pub source_ip: String,
}

/// `GET /token?service=<svc>&scope=<scope>...`
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    BasicAuth(credentials): BasicAuth,
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
) -> std::result::Result<Json<TokenResponse>, RegistryError> {
    let (service, scopes) = token_params(params);
    let source_ip = client_ip(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
        state.config.auth.trust_forwarded_for,
    );

    let token_request = TokenRequest {
        service,
        scopes,
        credentials,
        source_ip,
    };

    let worker_state = state.clone();
    let result =
        tokio::task::spawn_blocking(move || handle_token_request(&worker_state, token_request))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token request task failed");
                RegistryError::unknown()
            })?;

    result
        .map(Json)
        .map_err(|e| RegistryError::from_error(&e, &state.config.auth.realm))
}

/// Any method other than GET on `/token`, HEAD included.
pub async fn unsupported_method() -> RegistryError {
    RegistryError::unsupported()
}

/// Runs parse, authenticate, authorize and issue for one request.
pub fn handle_token_request(state: &AppState, request: TokenRequest) -> Result<TokenResponse> {
    let requested = parse_scopes(request.scopes.iter().map(String::as_str));

    let (user, credential) = match &request.credentials {
        Some(creds) => {
            let (user, credential) = authenticate_caller(state, creds, &request.source_ip)?;
            (Some(user), credential)
        }
        None => (None, None),
    };

    let granted = authorize_access(
        state.store.as_ref(),
        user.as_ref(),
        credential.as_ref(),
        &requested,
    )?;

    let subject = user.as_ref().map(|u| u.username.as_str()).unwrap_or("");
    state
        .issuer
        .issue(subject, granted, &request.service, &state.config.token.service)
}

fn authenticate_caller(
    state: &AppState,
    creds: &BasicCredentials,
    source_ip: &str,
) -> Result<(User, Option<AccessCredential>)> {
    let store = state.store.as_ref();

    let result = if state.config.auth.allow_password && !looks_like_token(&creds.secret) {
        authenticate_password(store, &creds.username, &creds.secret).map(|user| (user, None))
    } else {
        authenticate(store, &creds.username, &creds.secret, source_ip)
            .map(|(credential, user)| (user, Some(credential)))
    };

    if let Err(Error::AuthenticationFailed(cause)) = &result {
        tracing::warn!(
            username = %creds.username,
            source_ip,
            %cause,
            "Authentication failed"
        );
    }

    result
}

/// Picks `service` (last one wins) and every `scope` out of the query pairs.
pub fn token_params(params: Vec<(String, String)>) -> (String, Vec<String>) {
    let mut service = String::new();
    let mut scopes = Vec::new();

    for (key, value) in params {
        match key.as_str() {
            "service" => service = value,
            "scope" => scopes.push(value),
            _ => {}
        }
    }

    (service, scopes)
}

/// The caller's address: first `X-Forwarded-For` hop when trusted, else the peer.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
