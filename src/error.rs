use thiserror::Error;

/// Why an authentication attempt was rejected. Logged server-side only;
/// callers always see the same generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("identity not found")]
    IdentityNotFound,

    #[error("credential not found")]
    CredentialNotFound,

    #[error("credential does not belong to user")]
    CredentialNotOwned,

    #[error("credential has expired")]
    CredentialExpired,

    #[error("invalid password")]
    InvalidPassword,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(AuthFailure),

    #[error("requested service {requested:?} does not match {expected:?}")]
    ServiceMismatch { requested: String, expected: String },
}

impl From<AuthFailure> for Error {
    fn from(cause: AuthFailure) -> Self {
        Error::AuthenticationFailed(cause)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
