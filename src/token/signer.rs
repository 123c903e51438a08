use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

use super::Claims;
use crate::config::TokenConfig;
use crate::error::{Error, Result};

/// Produces the compact signed form of a set of claims.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<String>;
}

/// Signs claims as a JWS using `jsonwebtoken`.
pub struct JwtSigner {
    header: Header,
    key: EncodingKey,
}

impl JwtSigner {
    /// Builds a signer. When a certificate chain is given it is embedded as
    /// the `x5c` protected header so registries can verify without a key file.
    #[must_use]
    pub fn new(
        algorithm: Algorithm,
        key: EncodingKey,
        certificate_chain: Option<Vec<String>>,
    ) -> Self {
        let mut header = Header::new(algorithm);
        header.x5c = certificate_chain;
        Self { header, key }
    }

    /// Loads the signing key (and optional certificate chain) named in the config.
    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm).map_err(|_| {
            Error::Config(format!(
                "unsupported signing algorithm '{}'",
                config.algorithm
            ))
        })?;

        let key_path = config
            .signing_key
            .as_deref()
            .ok_or_else(|| Error::Config("token.signing_key is required".to_string()))?;
        let key_bytes = fs::read(key_path)?;
        let key = load_key(algorithm, &key_bytes)?;

        let chain = match &config.certificate_chain {
            Some(path) => Some(load_certificate_chain(path)?),
            None => None,
        };

        tracing::info!(
            algorithm = ?algorithm,
            key = %key_path.display(),
            x5c = chain.is_some(),
            "Loaded token signing key"
        );

        Ok(Self::new(algorithm, key, chain))
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> Result<String> {
        Ok(jsonwebtoken::encode(&self.header, claims, &self.key)?)
    }
}

fn load_key(algorithm: Algorithm, bytes: &[u8]) -> Result<EncodingKey> {
    let key = match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            let secret = std::str::from_utf8(bytes)
                .map(str::trim)
                .map_err(|_| Error::Config("HMAC secret must be UTF-8".to_string()))?;
            if secret.is_empty() {
                return Err(Error::Config("HMAC secret is empty".to_string()));
            }
            EncodingKey::from_secret(secret.as_bytes())
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => EncodingKey::from_rsa_pem(bytes)?,
        Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(bytes)?,
        Algorithm::EdDSA => EncodingKey::from_ed_pem(bytes)?,
    };
    Ok(key)
}

/// Reads a PEM bundle and returns each certificate as base64 DER, leaf first.
pub fn load_certificate_chain(path: &Path) -> Result<Vec<String>> {
    let pem = fs::read_to_string(path)?;
    parse_certificate_chain(&pem)
}

fn parse_certificate_chain(pem: &str) -> Result<Vec<String>> {
    let mut reader = BufReader::new(pem.as_bytes());
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("invalid certificate in chain: {e}")))?;

    if certs.is_empty() {
        return Err(Error::Config(
            "certificate chain contains no certificates".to_string(),
        ));
    }

    Ok(certs.iter().map(|cert| STANDARD.encode(cert)).collect())
}
