use chrono::Utc;

use super::{SecretHasher, find_credential_by_secret};
use crate::error::{AuthFailure, Result};
use crate::store::Store;
use crate::types::{AccessCredential, UsageLogEntry, User};

/// Verifies a personal access token presented together with a username.
///
/// The username and the secret are resolved independently and then
/// cross-checked. Every rejection is an `AuthenticationFailed` carrying the
/// inner cause; a failing usage-log append is returned as-is.
pub fn authenticate(
    store: &dyn Store,
    username: &str,
    secret: &str,
    source_ip: &str,
) -> Result<(AccessCredential, User)> {
    let user = store
        .get_user_by_username(username)?
        .ok_or(AuthFailure::IdentityNotFound)?;

    let credential =
        find_credential_by_secret(store, secret)?.ok_or(AuthFailure::CredentialNotFound)?;

    if credential.user_id != user.id {
        return Err(AuthFailure::CredentialNotOwned.into());
    }

    let now = Utc::now();
    if credential.is_expired_at(now) {
        return Err(AuthFailure::CredentialExpired.into());
    }

    store.append_usage_log(&UsageLogEntry {
        credential_id: credential.id.clone(),
        source_ip: source_ip.to_string(),
        used_at: now,
    })?;

    Ok((credential, user))
}

/// Verifies a username/password pair. A password login carries no
/// credential, so no permission-level limit applies and nothing is logged.
pub fn authenticate_password(store: &dyn Store, username: &str, password: &str) -> Result<User> {
    let user = store
        .get_user_by_username(username)?
        .ok_or(AuthFailure::IdentityNotFound)?;

    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AuthFailure::InvalidPassword.into());
    };

    if !SecretHasher::new().verify(password, hash)? {
        return Err(AuthFailure::InvalidPassword.into());
    }

    Ok(user)
}
