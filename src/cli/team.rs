use chrono::Utc;
use inquire::Confirm;
use uuid::Uuid;

use crate::server::validation::validate_namespace_name;
use crate::store::Store;
use crate::types::{Role, Team, TeamMember};

use super::{init_store, require_user};

fn require_team(store: &impl Store, name: &str) -> anyhow::Result<Team> {
    store
        .get_team_by_name(name)?
        .ok_or_else(|| anyhow::anyhow!("Team not found: {}", name))
}

pub fn run_team_add(data_dir: String, name: String, owner: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    validate_namespace_name(&name).map_err(anyhow::Error::msg)?;

    let owner = require_user(&store, &owner)?;

    if store.get_namespace_by_name(&name)?.is_some() {
        anyhow::bail!("Namespace '{}' already exists", name);
    }

    let now = Utc::now();
    let team = Team {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
        namespace_id: Uuid::new_v4().to_string(),
        created_at: now,
    };
    store.create_team(&team)?;
    store.add_team_member(&TeamMember {
        team_id: team.id.clone(),
        user_id: owner.id.clone(),
        role: Role::Admin,
        created_at: now,
    })?;

    println!();
    println!(
        "Created team \"{}\" with namespace \"{}\", admin \"{}\"",
        name, name, owner.username
    );
    println!();

    Ok(())
}

pub fn run_team_add_member(
    data_dir: String,
    team: String,
    username: String,
    admin: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let team = require_team(&store, &team)?;
    let user = require_user(&store, &username)?;

    let role = if admin { Role::Admin } else { Role::User };
    store
        .add_team_member(&TeamMember {
            team_id: team.id.clone(),
            user_id: user.id.clone(),
            role,
            created_at: Utc::now(),
        })
        .map_err(|e| match e {
            crate::error::Error::AlreadyExists => {
                anyhow::anyhow!("\"{}\" is already a member of \"{}\"", username, team.name)
            }
            e => e.into(),
        })?;

    println!("Added \"{}\" to \"{}\" as {}.", username, team.name, role);
    Ok(())
}

pub fn run_team_remove_member(
    data_dir: String,
    team: String,
    username: String,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let team = require_team(&store, &team)?;
    let user = require_user(&store, &username)?;

    if !store.remove_team_member(&team.id, &user.id)? {
        anyhow::bail!("\"{}\" is not a member of \"{}\"", username, team.name);
    }

    println!("Removed \"{}\" from \"{}\".", username, team.name);
    Ok(())
}

pub fn run_team_remove(data_dir: String, name: String, yes: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let team = require_team(&store, &name)?;

    let confirmed = yes
        || Confirm::new(&format!("Remove team '{name}' with all its repositories?"))
            .with_default(false)
            .prompt()?;
    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_team(&team.id)?;

    println!("Team \"{name}\" deleted.");
    Ok(())
}

pub fn run_team_members(data_dir: String, team: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let team = require_team(&store, &team)?;
    let members = store.list_team_members(&team.id)?;

    if members.is_empty() {
        println!("No members.");
        return Ok(());
    }

    println!();
    for member in &members {
        let username = store
            .get_user(&member.user_id)?
            .map(|u| u.username)
            .unwrap_or_else(|| member.user_id.clone());
        println!("  {}  {}", username, member.role);
    }
    println!();

    Ok(())
}
