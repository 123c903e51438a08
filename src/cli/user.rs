use std::io::BufRead;

use chrono::Utc;
use inquire::{Confirm, Password};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::SecretHasher;
use crate::server::validation::validate_namespace_name;
use crate::store::Store;
use crate::types::{Role, User};

use super::{init_store, require_user};

#[derive(Serialize)]
struct UserOutput {
    id: String,
    username: String,
    role: Role,
    password_login: bool,
    created_at: String,
}

/// Reads the first line of stdin, without the trailing newline.
fn read_password_stdin() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password read from stdin is empty");
    }
    Ok(password)
}

fn prompt_password() -> anyhow::Result<String> {
    Ok(Password::new("Password:")
        .with_validator(inquire::min_length!(8, "Password must be at least 8 characters"))
        .prompt()?)
}

pub fn run_user_add(
    data_dir: String,
    username: String,
    admin: bool,
    password: bool,
    password_stdin: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    validate_namespace_name(&username).map_err(anyhow::Error::msg)?;

    if store.get_namespace_by_name(&username)?.is_some() {
        anyhow::bail!("Namespace '{}' already exists", username);
    }

    let password_hash = if password_stdin {
        Some(SecretHasher::new().hash(&read_password_stdin()?)?)
    } else if password {
        Some(SecretHasher::new().hash(&prompt_password()?)?)
    } else {
        None
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        role: if admin { Role::Admin } else { Role::User },
        namespace_id: Uuid::new_v4().to_string(),
        password_hash,
        created_at: now,
        updated_at: now,
    };

    store.create_user(&user)?;

    println!();
    println!("Created user \"{}\" with namespace \"{}\"", username, username);
    println!();

    Ok(())
}

pub fn run_user_passwd(
    data_dir: String,
    username: String,
    password_stdin: bool,
    clear: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let user = require_user(&store, &username)?;

    if clear {
        store.set_user_password(&user.id, None)?;
        println!("Password login disabled for \"{username}\".");
        return Ok(());
    }

    let password = if password_stdin {
        read_password_stdin()?
    } else {
        prompt_password()?
    };
    let hash = SecretHasher::new().hash(&password)?;
    store.set_user_password(&user.id, Some(&hash))?;

    println!("Password updated for \"{username}\".");
    Ok(())
}

pub fn run_user_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let users = store.list_users()?;

    if json {
        let output: Vec<UserOutput> = users
            .iter()
            .map(|u| UserOutput {
                id: u.id.clone(),
                username: u.username.clone(),
                role: u.role,
                password_login: u.password_hash.is_some(),
                created_at: u.created_at.to_rfc3339(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!();
    for user in &users {
        println!("  {}  {}  {}", user.username, user.role, user.id);
    }
    println!();

    Ok(())
}

pub fn run_user_remove(data_dir: String, username: String, yes: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let user = require_user(&store, &username)?;

    let confirmed = yes
        || Confirm::new(&format!(
            "Remove user '{username}' with all repositories and tokens?"
        ))
        .with_default(false)
        .prompt()?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_user(&user.id)?;
    println!("User \"{username}\" removed.");

    Ok(())
}
