use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::SecretHasher;
use crate::error::Error;
use crate::store::Store;
use crate::types::{AccessCredential, PermissionLevel};

use super::{init_store, require_user};

const MAX_CREATE_ATTEMPTS: usize = 3;

#[derive(Serialize)]
struct TokenOutput {
    id: String,
    lookup: String,
    permission: PermissionLevel,
    description: Option<String>,
    created_at: String,
    expires_at: String,
    expired: bool,
}

impl From<&AccessCredential> for TokenOutput {
    fn from(credential: &AccessCredential) -> Self {
        Self {
            id: credential.id.clone(),
            lookup: credential.token_lookup.clone(),
            permission: credential.permission,
            description: credential.description.clone(),
            created_at: credential.created_at.to_rfc3339(),
            expires_at: credential.expires_at.to_rfc3339(),
            expired: credential.is_expired_at(Utc::now()),
        }
    }
}

pub fn run_token_create(
    data_dir: String,
    username: String,
    permission: String,
    expires_days: i64,
    description: Option<String>,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let user = require_user(&store, &username)?;

    let permission = PermissionLevel::parse(&permission).ok_or_else(|| {
        anyhow::anyhow!("Permission must be one of readOnly, readWrite, readWriteDelete")
    })?;
    if expires_days <= 0 {
        anyhow::bail!("--expires-days must be positive");
    }

    let hasher = SecretHasher::new();
    let now = Utc::now();

    // The lookup segment is short, so retry on the rare collision.
    for _ in 0..MAX_CREATE_ATTEMPTS {
        let issued = hasher.issue_token()?;
        let credential = AccessCredential {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            description: description.clone(),
            permission,
            created_at: now,
            expires_at: now + Duration::days(expires_days),
        };

        match store.create_credential(&credential) {
            Ok(()) => {
                println!();
                println!(
                    "Token {} ({}) created for '{}': {}",
                    credential.id, permission, username, issued.raw
                );
                println!("  Save this now - it cannot be retrieved later.");
                println!();
                return Ok(());
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    anyhow::bail!("Failed to generate a unique token, try again")
}

pub fn run_token_list(data_dir: String, username: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let user = require_user(&store, &username)?;
    let credentials = store.list_user_credentials(&user.id)?;

    if json {
        let output: Vec<TokenOutput> = credentials.iter().map(TokenOutput::from).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if credentials.is_empty() {
        println!("No tokens found.");
        return Ok(());
    }

    println!();
    for credential in &credentials {
        let state = if credential.is_expired_at(Utc::now()) {
            "expired"
        } else {
            "active"
        };
        println!(
            "  {}  tbpat_{}...  {}  expires {}  {}",
            credential.id,
            credential.token_lookup,
            credential.permission,
            credential.expires_at.format("%Y-%m-%d"),
            state
        );
    }
    println!();

    Ok(())
}

pub fn run_token_revoke(data_dir: String, id: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    if !store.delete_credential(&id)? {
        anyhow::bail!("Token not found: {}", id);
    }

    println!("Token revoked.");
    Ok(())
}

pub fn run_token_usage(data_dir: String, id: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    // Entries outlive the credential, so a revoked token still has a history.
    let entries = store.list_usage_log(&id)?;
    if entries.is_empty() && store.get_credential_by_id(&id)?.is_none() {
        anyhow::bail!("Token not found: {}", id);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Never used.");
        return Ok(());
    }

    println!();
    for entry in &entries {
        println!("  {}  {}", entry.used_at.to_rfc3339(), entry.source_ip);
    }
    println!();

    Ok(())
}
