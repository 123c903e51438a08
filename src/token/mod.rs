mod issuer;
mod scope;
mod signer;

pub use issuer::{Claims, TOKEN_TTL_SECS, TokenIssuer, TokenResponse};
pub use scope::parse_scopes;
pub use signer::{JwtSigner, TokenSigner, load_certificate_chain};
