use chrono::Utc;
use uuid::Uuid;

use crate::server::validation::{validate_namespace_name, validate_repo_name};
use crate::store::Store;
use crate::types::{Repository, Visibility};

use super::init_store;

/// Splits and validates `<namespace>/<name>`.
fn split_repo_name(full_name: &str) -> anyhow::Result<(&str, &str)> {
    let (namespace, name) = full_name
        .split_once('/')
        .ok_or_else(|| anyhow::anyhow!("Repository must be given as <namespace>/<name>"))?;
    validate_namespace_name(namespace).map_err(anyhow::Error::msg)?;
    validate_repo_name(name).map_err(anyhow::Error::msg)?;
    Ok((namespace, name))
}

fn require_repo(store: &impl Store, full_name: &str) -> anyhow::Result<Repository> {
    let (namespace, name) = split_repo_name(full_name)?;
    store
        .get_repository(namespace, name)?
        .ok_or_else(|| anyhow::anyhow!("Repository not found: {}", full_name))
}

pub fn run_repo_add(data_dir: String, full_name: String, public: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let (namespace, name) = split_repo_name(&full_name)?;

    let ns = store
        .get_namespace_by_name(namespace)?
        .ok_or_else(|| anyhow::anyhow!("Namespace not found: {}", namespace))?;

    if store.get_repository(namespace, name)?.is_some() {
        anyhow::bail!("Repository '{}' already exists", full_name);
    }

    let now = Utc::now();
    let visibility = if public {
        Visibility::Public
    } else {
        Visibility::Private
    };
    store.create_repository(&Repository {
        id: Uuid::new_v4().to_string(),
        namespace_id: ns.id,
        name: name.to_string(),
        visibility,
        created_at: now,
        updated_at: now,
    })?;

    println!("Created {} repository \"{}\".", visibility.as_str(), full_name);
    Ok(())
}

pub fn run_repo_visibility(
    data_dir: String,
    full_name: String,
    visibility: String,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let visibility = Visibility::parse(&visibility)
        .ok_or_else(|| anyhow::anyhow!("Visibility must be \"public\" or \"private\""))?;
    let repo = require_repo(&store, &full_name)?;

    store.set_repository_visibility(&repo.id, visibility)?;

    println!("\"{}\" is now {}.", full_name, visibility.as_str());
    Ok(())
}

pub fn run_repo_list(data_dir: String, namespace: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let ns = store
        .get_namespace_by_name(&namespace)?
        .ok_or_else(|| anyhow::anyhow!("Namespace not found: {}", namespace))?;

    let repos = store.list_repositories(&ns.id)?;
    if repos.is_empty() {
        println!("No repositories in \"{namespace}\".");
        return Ok(());
    }

    println!();
    for repo in &repos {
        println!("  {}/{}  {}", namespace, repo.name, repo.visibility.as_str());
    }
    println!();

    Ok(())
}

pub fn run_repo_remove(data_dir: String, full_name: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let repo = require_repo(&store, &full_name)?;

    store.delete_repository(&repo.id)?;

    println!("Repository \"{full_name}\" deleted.");
    Ok(())
}
