use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn invalid_column(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(Error::Config(format!("invalid {what} '{value}' in database"))),
    )
}

/// Maps a UNIQUE/foreign-key violation to `on_conflict`, anything else to a database error.
fn map_constraint(e: rusqlite::Error, on_conflict: Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            on_conflict
        }
        e => Error::from(e),
    }
}

fn role_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let value: String = row.get(idx)?;
    Role::parse(&value).ok_or_else(|| invalid_column(idx, "role", &value))
}

const USER_COLUMNS: &str =
    "id, username, role, namespace_id, password_hash, created_at, updated_at";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role: role_column(row, 2)?,
        namespace_id: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn row_to_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        namespace_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

const REPOSITORY_COLUMNS: &str =
    "r.id, r.namespace_id, r.name, r.visibility, r.created_at, r.updated_at";

fn row_to_repository(row: &Row<'_>) -> rusqlite::Result<Repository> {
    let visibility: String = row.get(3)?;
    Ok(Repository {
        id: row.get(0)?,
        namespace_id: row.get(1)?,
        name: row.get(2)?,
        visibility: Visibility::parse(&visibility)
            .ok_or_else(|| invalid_column(3, "visibility", &visibility))?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const CREDENTIAL_COLUMNS: &str =
    "id, user_id, token_hash, token_lookup, description, permission, created_at, expires_at";

fn row_to_credential(row: &Row<'_>) -> rusqlite::Result<AccessCredential> {
    let permission: String = row.get(5)?;
    Ok(AccessCredential {
        id: row.get(0)?,
        user_id: row.get(1)?,
        token_hash: row.get(2)?,
        token_lookup: row.get(3)?,
        description: row.get(4)?,
        permission: PermissionLevel::parse(&permission)
            .ok_or_else(|| invalid_column(5, "permission", &permission))?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        expires_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Namespace operations

    fn get_namespace_by_name(&self, name: &str) -> Result<Option<Namespace>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM namespaces WHERE name = ?1",
            params![name],
            |row| {
                Ok(Namespace {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO namespaces (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                user.namespace_id,
                user.username,
                format_datetime(&user.created_at)
            ],
        )
        .map_err(|e| map_constraint(e, Error::AlreadyExists))?;

        tx.execute(
            "INSERT INTO users (id, username, role, namespace_id, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.username,
                user.role.as_str(),
                user.namespace_id,
                user.password_hash,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )
        .map_err(|e| map_constraint(e, Error::AlreadyExists))?;

        tx.commit()?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            row_to_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            row_to_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))?;

        let rows = stmt.query_map([], row_to_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_user_password(&self, id: &str, password_hash: Option<&str>) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        // Deleting the namespace cascades to the user, its repositories and credentials.
        let rows = self.conn().execute(
            "DELETE FROM namespaces WHERE id = (SELECT namespace_id FROM users WHERE id = ?1)",
            params![id],
        )?;
        Ok(rows > 0)
    }

    // Team operations

    fn create_team(&self, team: &Team) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO namespaces (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![team.namespace_id, team.name, format_datetime(&team.created_at)],
        )
        .map_err(|e| map_constraint(e, Error::AlreadyExists))?;

        tx.execute(
            "INSERT INTO teams (id, name, namespace_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                team.id,
                team.name,
                team.namespace_id,
                format_datetime(&team.created_at)
            ],
        )
        .map_err(|e| map_constraint(e, Error::AlreadyExists))?;

        tx.commit()?;
        Ok(())
    }

    fn get_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, namespace_id, created_at FROM teams WHERE name = ?1",
            params![name],
            row_to_team,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_team(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM namespaces WHERE id = (SELECT namespace_id FROM teams WHERE id = ?1)",
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn add_team_member(&self, member: &TeamMember) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO team_members (team_id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    member.team_id,
                    member.user_id,
                    member.role.as_str(),
                    format_datetime(&member.created_at),
                ],
            )
            .map_err(|e| map_constraint(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM team_members WHERE team_id = ?1 AND user_id = ?2",
            params![team_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_team_members(&self, team_id: &str) -> Result<Vec<TeamMember>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT team_id, user_id, role, created_at FROM team_members
             WHERE team_id = ?1 ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![team_id], |row| {
            Ok(TeamMember {
                team_id: row.get(0)?,
                user_id: row.get(1)?,
                role: role_column(row, 2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_user_teams(&self, user_id: &str) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.namespace_id, t.created_at
             FROM teams t JOIN team_members m ON m.team_id = t.id
             WHERE m.user_id = ?1 ORDER BY t.name",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_team)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Repository operations

    fn create_repository(&self, repo: &Repository) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO repositories (id, namespace_id, name, visibility, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    repo.id,
                    repo.namespace_id,
                    repo.name,
                    repo.visibility.as_str(),
                    format_datetime(&repo.created_at),
                    format_datetime(&repo.updated_at),
                ],
            )
            .map_err(|e| map_constraint(e, Error::AlreadyExists))?;
        Ok(())
    }

    fn get_repository(&self, namespace: &str, name: &str) -> Result<Option<Repository>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {REPOSITORY_COLUMNS} FROM repositories r
                 JOIN namespaces n ON n.id = r.namespace_id
                 WHERE n.name = ?1 AND r.name = ?2"
            ),
            params![namespace, name],
            row_to_repository,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_repositories(&self, namespace_id: &str) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories r WHERE r.namespace_id = ?1 ORDER BY r.name"
        ))?;

        let rows = stmt.query_map(params![namespace_id], row_to_repository)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_repository_visibility(&self, id: &str, visibility: Visibility) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE repositories SET visibility = ?1, updated_at = ?2 WHERE id = ?3",
            params![visibility.as_str(), format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_repository(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM repositories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Credential operations

    fn create_credential(&self, credential: &AccessCredential) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO credentials (id, user_id, token_hash, token_lookup, description, permission, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                credential.id,
                credential.user_id,
                credential.token_hash,
                credential.token_lookup,
                credential.description,
                credential.permission.as_str(),
                format_datetime(&credential.created_at),
                format_datetime(&credential.expires_at),
            ],
        );

        result
            .map(|_| ())
            .map_err(|e| map_constraint(e, Error::TokenLookupCollision))
    }

    fn get_credential_by_id(&self, id: &str) -> Result<Option<AccessCredential>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ?1"),
            params![id],
            row_to_credential,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_credential_by_lookup(&self, lookup: &str) -> Result<Option<AccessCredential>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE token_lookup = ?1"),
            params![lookup],
            row_to_credential,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_user_credentials(&self, user_id: &str) -> Result<Vec<AccessCredential>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_credential)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_credential(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM credentials WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Usage log

    fn append_usage_log(&self, entry: &UsageLogEntry) -> Result<()> {
        self.conn().execute(
            "INSERT INTO usage_log (credential_id, source_ip, used_at) VALUES (?1, ?2, ?3)",
            params![
                entry.credential_id,
                entry.source_ip,
                format_datetime(&entry.used_at)
            ],
        )?;
        Ok(())
    }

    fn list_usage_log(&self, credential_id: &str) -> Result<Vec<UsageLogEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT credential_id, source_ip, used_at FROM usage_log
             WHERE credential_id = ?1 ORDER BY seq",
        )?;

        let rows = stmt.query_map(params![credential_id], |row| {
            Ok(UsageLogEntry {
                credential_id: row.get(0)?,
                source_ip: row.get(1)?,
                used_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}
