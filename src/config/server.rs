use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub token: TokenConfig,
    pub auth: AuthConfig,
}

/// Settings for the signed tokens handed to registry clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// `iss` claim. Must match the registry's configured issuer.
    pub issuer: String,
    /// The only service (audience) tokens are issued for.
    pub service: String,
    /// JWS algorithm name, e.g. "RS256", "ES256", "EdDSA" or "HS256".
    pub algorithm: String,
    /// PEM private key, or a file holding the shared secret for HS* algorithms.
    pub signing_key: Option<PathBuf>,
    /// PEM certificate bundle embedded as the `x5c` header.
    pub certificate_chain: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm advertised in `WWW-Authenticate` on 401 responses.
    pub realm: String,
    /// Accept account passwords in addition to personal access tokens.
    pub allow_password: bool,
    /// Take the client address from the first `X-Forwarded-For` hop.
    pub trust_forwarded_for: bool,
}

impl ServerConfig {
    /// Loads a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tollbooth.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            data_dir: PathBuf::from("./data"),
            token: TokenConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: "tollbooth".to_string(),
            service: "container-registry".to_string(),
            algorithm: "RS256".to_string(),
            signing_key: None,
            certificate_chain: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "tollbooth".to_string(),
            allow_password: false,
            trust_forwarded_for: false,
        }
    }
}
