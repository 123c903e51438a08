mod authenticate;
mod basic;
mod secret;

pub use authenticate::{authenticate, authenticate_password};
pub use basic::{BasicAuth, BasicCredentials, parse_basic_auth};
pub use secret::{
    IssuedToken, SecretHasher, TokenParts, find_credential_by_secret, looks_like_token, parse_token,
};
