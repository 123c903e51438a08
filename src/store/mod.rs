mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Lookups return `Ok(None)` when the record does not exist; `Err` is
/// reserved for infrastructure failures.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Namespace operations
    fn get_namespace_by_name(&self, name: &str) -> Result<Option<Namespace>>;

    // User operations (creating a user also creates its namespace)
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn set_user_password(&self, id: &str, password_hash: Option<&str>) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;

    // Team operations (creating a team also creates its namespace)
    fn create_team(&self, team: &Team) -> Result<()>;
    fn get_team_by_name(&self, name: &str) -> Result<Option<Team>>;
    fn delete_team(&self, id: &str) -> Result<bool>;
    fn add_team_member(&self, member: &TeamMember) -> Result<()>;
    fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<bool>;
    fn list_team_members(&self, team_id: &str) -> Result<Vec<TeamMember>>;
    fn list_user_teams(&self, user_id: &str) -> Result<Vec<Team>>;

    // Repository operations
    fn create_repository(&self, repo: &Repository) -> Result<()>;
    fn get_repository(&self, namespace: &str, name: &str) -> Result<Option<Repository>>;
    fn list_repositories(&self, namespace_id: &str) -> Result<Vec<Repository>>;
    fn set_repository_visibility(&self, id: &str, visibility: Visibility) -> Result<()>;
    fn delete_repository(&self, id: &str) -> Result<bool>;

    // Credential operations
    fn create_credential(&self, credential: &AccessCredential) -> Result<()>;
    fn get_credential_by_id(&self, id: &str) -> Result<Option<AccessCredential>>;
    fn get_credential_by_lookup(&self, lookup: &str) -> Result<Option<AccessCredential>>;
    fn list_user_credentials(&self, user_id: &str) -> Result<Vec<AccessCredential>>;
    fn delete_credential(&self, id: &str) -> Result<bool>;

    // Usage log (append-only)
    fn append_usage_log(&self, entry: &UsageLogEntry) -> Result<()>;
    fn list_usage_log(&self, credential_id: &str) -> Result<Vec<UsageLogEntry>>;
}
