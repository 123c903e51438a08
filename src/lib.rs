//! # Tollbooth
//!
//! A token service for container registries implementing the Docker/OCI
//! bearer-token handshake. Clients call `GET /token?service=..&scope=..`,
//! optionally with Basic credentials, and receive a short-lived signed JWT
//! whose `access` claim lists exactly the repository actions they were
//! granted.
//!
//! The request pipeline is:
//!
//! 1. [`token::parse_scopes`] turns `scope` parameters into requested access.
//! 2. [`auth::authenticate`] verifies a username and personal access token.
//! 3. [`authz::authorize_access`] reduces the request to what may be granted.
//! 4. [`token::TokenIssuer`] signs the claims.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollbooth::config::ServerConfig;
//! use tollbooth::server::{AppState, create_router};
//! use tollbooth::store::{SqliteStore, Store};
//! use tollbooth::token::{JwtSigner, TokenIssuer};
//!
//! let config = ServerConfig::load("tollbooth.toml".as_ref())?;
//! let store = SqliteStore::new(config.db_path())?;
//! store.initialize()?;
//!
//! let signer = JwtSigner::from_config(&config.token)?;
//! let issuer = TokenIssuer::new(config.token.issuer.clone(), Arc::new(signer));
//! let router = create_router(Arc::new(AppState::new(Arc::new(store), issuer, config)));
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the operator CLI module. Disable with `default-features = false`.

pub mod auth;
pub mod authz;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod token;
pub mod types;
