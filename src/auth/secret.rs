//! Personal access tokens and Argon2id secret hashing.
//!
//! A token reads `tbpat_<lookup>_<secret>`, both parts lowercase hex. The
//! lookup is stored in clear and indexes the credential row. The whole token
//! is only ever stored as an Argon2id PHC string, and account passwords are
//! hashed the same way.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::AccessCredential;

const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "tbpat_";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;

/// Hashes and verifies secrets with Argon2id.
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

/// A freshly minted token. `raw` is shown to the operator once and never stored.
pub struct IssuedToken {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("lookup", &self.lookup)
            .field("raw", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Borrowed halves of a well-formed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub lookup: &'a str,
    pub secret: &'a str,
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretHasher {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .expect("constant argon2 parameters are valid");

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Mints a random token and hashes it for storage.
    pub fn issue_token(&self) -> Result<IssuedToken> {
        let lookup = random_hex(LOOKUP_BYTES);
        let raw = format!("{TOKEN_PREFIX}{lookup}_{}", random_hex(SECRET_BYTES));
        let hash = self.hash(&raw)?;
        Ok(IssuedToken { raw, lookup, hash })
    }

    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Crypto(format!("failed to hash secret: {e}")))
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::Crypto(format!("invalid stored hash: {e}")))?;

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Crypto(format!("failed to verify secret: {e}"))),
        }
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Splits a token into lookup and secret. Anything else is `InvalidTokenFormat`.
pub fn parse_token(token: &str) -> Result<TokenParts<'_>> {
    let (lookup, secret) = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|rest| rest.split_once('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let is_hex = |s: &str, bytes: usize| {
        s.len() == bytes * 2 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    };
    if !is_hex(lookup, LOOKUP_BYTES) || !is_hex(secret, SECRET_BYTES) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(TokenParts { lookup, secret })
}

#[must_use]
pub fn looks_like_token(secret: &str) -> bool {
    parse_token(secret).is_ok()
}

/// Resolves a raw token to its credential record.
///
/// Malformed tokens, unknown lookups and hash mismatches are all `Ok(None)`.
/// Expiry and ownership are left to the caller.
pub fn find_credential_by_secret(
    store: &dyn Store,
    secret: &str,
) -> Result<Option<AccessCredential>> {
    let parts = match parse_token(secret) {
        Ok(parts) => parts,
        Err(Error::InvalidTokenFormat) => return Ok(None),
        Err(e) => return Err(e),
    };

    let Some(credential) = store.get_credential_by_lookup(parts.lookup)? else {
        return Ok(None);
    };

    if SecretHasher::new().verify(secret, &credential.token_hash)? {
        Ok(Some(credential))
    } else {
        Ok(None)
    }
}
