mod commands;
mod repo;
mod team;
mod token;
mod user;

pub use commands::{AdminCommands, RepoCommands, TeamCommands, TokenCommands, UserCommands};
pub use repo::{run_repo_add, run_repo_list, run_repo_remove, run_repo_visibility};
pub use team::{
    run_team_add, run_team_add_member, run_team_members, run_team_remove, run_team_remove_member,
};
pub use token::{run_token_create, run_token_list, run_token_revoke, run_token_usage};
pub use user::{run_user_add, run_user_list, run_user_passwd, run_user_remove};

use crate::store::{SqliteStore, Store};
use crate::types::User;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join("tollbooth.db");

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'tollbooth admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

pub(crate) fn require_user(store: &impl Store, username: &str) -> anyhow::Result<User> {
    store
        .get_user_by_username(username)?
        .ok_or_else(|| anyhow::anyhow!("User not found: {}", username))
}
