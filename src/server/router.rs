use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::token::{issue_token, unsupported_method};
use crate::config::ServerConfig;
use crate::store::Store;
use crate::token::TokenIssuer;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub issuer: TokenIssuer,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, issuer: TokenIssuer, config: ServerConfig) -> Self {
        Self {
            store,
            issuer,
            config,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/token",
            get(issue_token)
                .head(unsupported_method)
                .fallback(unsupported_method),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
