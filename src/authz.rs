//! Scope-based authorization.
//!
//! Reduces a list of requested `(type, name, actions)` triples to the subset
//! the caller may exercise. A caller controls the namespace named after its
//! username and the namespaces of every team it belongs to; controlled
//! namespaces grant every action, public repositories grant `pull` to
//! everyone, and a personal access token further caps the result at its
//! permission level.

use std::collections::HashSet;

use crate::error::Result;
use crate::store::Store;
use crate::types::{AccessCredential, Actions, REPOSITORY_TYPE, ResourceActions, User};

/// Why a single requested entry was dropped. Never leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessNotGranted {
    UnsupportedType,
    MalformedName,
    RepositoryNotFound,
    NoActions,
}

/// Computes the granted subset of `requested`.
///
/// `identity` and `credential` are both `None` for anonymous callers. When an
/// identity is present without a credential (password login) no
/// permission-level limit applies. Store failures abort the whole call.
pub fn authorize_access(
    store: &dyn Store,
    identity: Option<&User>,
    credential: Option<&AccessCredential>,
    requested: &[ResourceActions],
) -> Result<Vec<ResourceActions>> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let namespaces = authorized_namespaces(store, identity)?;
    let limit = credential.map(|c| c.permission.allowed_actions());

    let mut granted = Vec::with_capacity(requested.len());
    for entry in requested {
        match authorize_entry(store, &namespaces, limit, entry)? {
            Ok(grant) => granted.push(grant),
            Err(reason) => {
                tracing::debug!(
                    resource_type = %entry.resource_type,
                    name = %entry.name,
                    ?reason,
                    "access not granted"
                );
            }
        }
    }

    Ok(granted)
}

/// The caller's username plus the names of all teams it belongs to.
fn authorized_namespaces(store: &dyn Store, identity: Option<&User>) -> Result<HashSet<String>> {
    let Some(user) = identity else {
        return Ok(HashSet::new());
    };

    let mut namespaces: HashSet<String> = store
        .list_user_teams(&user.id)?
        .into_iter()
        .map(|team| team.name)
        .collect();
    namespaces.insert(user.username.clone());

    Ok(namespaces)
}

fn authorize_entry(
    store: &dyn Store,
    namespaces: &HashSet<String>,
    limit: Option<Actions>,
    entry: &ResourceActions,
) -> Result<std::result::Result<ResourceActions, AccessNotGranted>> {
    if entry.resource_type != REPOSITORY_TYPE {
        return Ok(Err(AccessNotGranted::UnsupportedType));
    }

    let Some((namespace, name)) = entry.repository_path() else {
        return Ok(Err(AccessNotGranted::MalformedName));
    };

    let Some(repo) = store.get_repository(namespace, name)? else {
        return Ok(Err(AccessNotGranted::RepositoryNotFound));
    };

    let mut allowed = if namespaces.contains(namespace) {
        Actions::ALL
    } else if repo.visibility.is_public() {
        Actions::PULL
    } else {
        Actions::NONE
    };

    if let Some(limit) = limit {
        allowed = allowed.intersect(limit);
    }

    let actions = filter_requested(&entry.actions, allowed);
    if actions.is_empty() {
        return Ok(Err(AccessNotGranted::NoActions));
    }

    Ok(Ok(ResourceActions::new(
        entry.resource_type.clone(),
        entry.name.clone(),
        actions,
    )))
}

/// Keeps the requested actions that are in `allowed`, in request order and
/// without duplicates. Unknown action names never survive.
fn filter_requested(requested: &[String], allowed: Actions) -> Vec<String> {
    let mut seen = Actions::NONE;
    let mut actions = Vec::new();

    for action in requested {
        let Some(bit) = Actions::parse(action) else {
            continue;
        };
        if allowed.has(bit) && !seen.has(bit) {
            seen = seen.union(bit);
            actions.push(action.clone());
        }
    }

    actions
}
