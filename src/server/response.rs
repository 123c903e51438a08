use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// One entry of a registry-style error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Error that renders as `[{"code": ..., "message": ...}]` with a status.
#[derive(Debug)]
pub struct RegistryError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Realm for the `WWW-Authenticate` challenge on 401 responses.
    pub realm: Option<String>,
}

impl RegistryError {
    #[must_use]
    pub fn unauthorized(realm: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: "authentication failed".to_string(),
            realm: Some(realm.to_string()),
        }
    }

    #[must_use]
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "DENIED",
            message: message.into(),
            realm: None,
        }
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            code: "UNSUPPORTED",
            message: "the operation is unsupported".to_string(),
            realm: None,
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "UNKNOWN",
            message: "unknown error".to_string(),
            realm: None,
        }
    }

    /// Maps a pipeline error to what the caller may see. Authentication
    /// causes are collapsed and infrastructure details are only logged.
    #[must_use]
    pub fn from_error(err: &Error, realm: &str) -> Self {
        match err {
            Error::AuthenticationFailed(_) => Self::unauthorized(realm),
            Error::ServiceMismatch { .. } => {
                Self::denied("token requested for an unsupported service")
            }
            other => {
                tracing::error!(error = %other, "Token request failed");
                Self::unknown()
            }
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let body = vec![ErrorBody {
            code: self.code,
            message: self.message,
        }];

        let mut response = (self.status, Json(body)).into_response();

        if let Some(realm) = self.realm {
            if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{realm}\"")) {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}
