//! CLI integration tests for tollbooth admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use chrono::Utc;
use predicates::prelude::*;
use serde_json::Value;

use tollbooth::auth::{find_credential_by_secret, parse_token};
use tollbooth::store::{SqliteStore, Store};
use tollbooth::types::{PermissionLevel, UsageLogEntry, Visibility};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tollbooth").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Runs `tollbooth admin <args> --data-dir <tmp>`.
    fn admin(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let data_dir = self.data_dir_str();
        self.cmd()
            .arg("admin")
            .args(args)
            .args(["--data-dir", &data_dir])
            .assert()
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.admin(&["init"])
    }

    fn add_user(&self, username: &str) {
        self.admin(&["user", "add", "--username", username]).success();
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.admin(args).success().get_output().stdout.clone();
        serde_json::from_slice(&output).expect("failed to parse JSON")
    }

    fn open_store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("tollbooth.db")).expect("open store")
    }
}

/// Pulls the raw `tbpat_` token out of `token create` output.
fn extract_token(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .split_whitespace()
        .find(|word| word.starts_with("tbpat_"))
        .expect("token not printed")
        .to_string()
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn init_creates_database_file() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Initialized database"));

    assert!(ctx.data_dir().join("tollbooth.db").exists());
}

#[test]
fn init_is_idempotent() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.init().success();

    let users = ctx.json(&["user", "list", "--json"]);
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[test]
fn commands_require_initialized_database() {
    let ctx = TestContext::new();

    ctx.admin(&["user", "list"])
        .failure()
        .stderr(predicate::str::contains("admin init"));
}

// ============================================================================
// User Command Tests
// ============================================================================

#[test]
fn user_add_creates_user_and_namespace() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.admin(&["user", "add", "--username", "alice", "--admin"])
        .success()
        .stdout(predicate::str::contains("Created user \"alice\""));

    let users = ctx.json(&["user", "list", "--json"]);
    assert_eq!(users[0]["username"], "alice");
    assert_eq!(users[0]["role"], "admin");
    assert_eq!(users[0]["password_login"], false);

    assert!(ctx.open_store().get_namespace_by_name("alice").unwrap().is_some());
}

#[test]
fn user_add_rejects_duplicate_and_invalid_names() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.admin(&["user", "add", "--username", "alice"])
        .failure()
        .stderr(predicate::str::contains("already exists"));
    ctx.admin(&["user", "add", "--username", "Not Valid"]).failure();
}

#[test]
fn user_passwd_from_stdin_enables_password_login() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    let data_dir = ctx.data_dir_str();
    ctx.cmd()
        .args(["admin", "user", "passwd", "--username", "alice", "--password-stdin"])
        .args(["--data-dir", &data_dir])
        .write_stdin("hunter2hunter2\n")
        .assert()
        .success();

    let users = ctx.json(&["user", "list", "--json"]);
    assert_eq!(users[0]["password_login"], true);

    ctx.admin(&["user", "passwd", "--username", "alice", "--clear"])
        .success();
    let users = ctx.json(&["user", "list", "--json"]);
    assert_eq!(users[0]["password_login"], false);
}

#[test]
fn user_remove_deletes_repositories_and_tokens() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.admin(&["repo", "add", "alice/app"]).success();
    ctx.admin(&["token", "create", "--username", "alice"]).success();

    ctx.admin(&["user", "remove", "--username", "alice", "--yes"])
        .success();

    let store = ctx.open_store();
    assert!(store.get_user_by_username("alice").unwrap().is_none());
    assert!(store.get_namespace_by_name("alice").unwrap().is_none());
    assert!(store.get_repository("alice", "app").unwrap().is_none());
}

// ============================================================================
// Team Command Tests
// ============================================================================

#[test]
fn team_add_makes_owner_an_admin_member() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.add_user("bob");

    ctx.admin(&["team", "add", "--name", "platform", "--owner", "alice"])
        .success();
    ctx.admin(&["team", "add-member", "--team", "platform", "--username", "bob"])
        .success();

    ctx.admin(&["team", "members", "--team", "platform"])
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob"));

    let store = ctx.open_store();
    let alice = store.get_user_by_username("alice").unwrap().unwrap();
    let teams = store.list_user_teams(&alice.id).unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].name, "platform");
}

#[test]
fn team_name_cannot_shadow_a_user_namespace() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.admin(&["team", "add", "--name", "alice", "--owner", "alice"])
        .failure();
}

#[test]
fn team_remove_member() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.add_user("bob");
    ctx.admin(&["team", "add", "--name", "platform", "--owner", "alice"])
        .success();
    ctx.admin(&["team", "add-member", "--team", "platform", "--username", "bob"])
        .success();

    ctx.admin(&["team", "remove-member", "--team", "platform", "--username", "bob"])
        .success();

    let store = ctx.open_store();
    let bob = store.get_user_by_username("bob").unwrap().unwrap();
    assert!(store.list_user_teams(&bob.id).unwrap().is_empty());
}

#[test]
fn team_remove_deletes_namespace_and_repositories() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.admin(&["team", "add", "--name", "platform", "--owner", "alice"])
        .success();
    ctx.admin(&["repo", "add", "platform/base"]).success();

    ctx.admin(&["team", "remove", "--name", "platform", "--yes"])
        .success();

    let store = ctx.open_store();
    assert!(store.get_team_by_name("platform").unwrap().is_none());
    assert!(store.get_namespace_by_name("platform").unwrap().is_none());
    assert!(store.get_repository("platform", "base").unwrap().is_none());
}

// ============================================================================
// Repository Command Tests
// ============================================================================

#[test]
fn repo_add_and_change_visibility() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.admin(&["repo", "add", "alice/app"])
        .success()
        .stdout(predicate::str::contains("private"));
    let repo = ctx.open_store().get_repository("alice", "app").unwrap().unwrap();
    assert_eq!(repo.visibility, Visibility::Private);

    ctx.admin(&["repo", "visibility", "alice/app", "public"])
        .success();
    let repo = ctx.open_store().get_repository("alice", "app").unwrap().unwrap();
    assert_eq!(repo.visibility, Visibility::Public);

    ctx.admin(&["repo", "list", "alice"])
        .success()
        .stdout(predicate::str::contains("alice/app"));
}

#[test]
fn repo_add_requires_existing_namespace() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.admin(&["repo", "add", "ghost/app"])
        .failure()
        .stderr(predicate::str::contains("Namespace not found"));
    ctx.admin(&["repo", "add", "no-slash"]).failure();
}

#[test]
fn repo_remove() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.admin(&["repo", "add", "alice/app", "--public"]).success();

    ctx.admin(&["repo", "remove", "alice/app"]).success();

    assert!(ctx.open_store().get_repository("alice", "app").unwrap().is_none());
}

// ============================================================================
// Token Command Tests
// ============================================================================

#[test]
fn token_create_prints_raw_token_once() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    let output = ctx
        .admin(&[
            "token",
            "create",
            "--username",
            "alice",
            "--permission",
            "readWrite",
            "--description",
            "ci",
        ])
        .success()
        .get_output()
        .stdout
        .clone();
    let raw = extract_token(&output);
    let lookup = parse_token(&raw).expect("printed token parses").lookup;

    let store = ctx.open_store();
    let credential = find_credential_by_secret(&store, &raw).unwrap().unwrap();
    assert_eq!(credential.token_lookup, lookup);
    assert_eq!(credential.permission, PermissionLevel::ReadWrite);

    let tokens = ctx.json(&["token", "list", "--username", "alice", "--json"]);
    let tokens = tokens.as_array().unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0]["permission"], "readWrite");
    assert_eq!(tokens[0]["description"], "ci");
    assert_eq!(tokens[0]["expired"], false);
    assert!(!tokens[0].to_string().contains(&raw));
}

#[test]
fn token_create_rejects_unknown_permission() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.admin(&["token", "create", "--username", "alice", "--permission", "admin"])
        .failure();
    ctx.admin(&["token", "create", "--username", "alice", "--expires-days", "0"])
        .failure();
}

#[test]
fn token_revoke_and_usage() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.admin(&["token", "create", "--username", "alice"]).success();

    let tokens = ctx.json(&["token", "list", "--username", "alice", "--json"]);
    let id = tokens[0]["id"].as_str().unwrap().to_string();

    ctx.admin(&["token", "usage", "--id", &id])
        .success()
        .stdout(predicate::str::contains("Never used"));

    ctx.admin(&["token", "revoke", "--id", &id]).success();
    ctx.admin(&["token", "revoke", "--id", &id])
        .failure()
        .stderr(predicate::str::contains("Token not found"));

    let tokens = ctx.json(&["token", "list", "--username", "alice", "--json"]);
    assert!(tokens.as_array().unwrap().is_empty());
}

#[test]
fn token_usage_outlives_revocation() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.admin(&["token", "create", "--username", "alice"]).success();

    let tokens = ctx.json(&["token", "list", "--username", "alice", "--json"]);
    let id = tokens[0]["id"].as_str().unwrap().to_string();

    ctx.open_store()
        .append_usage_log(&UsageLogEntry {
            credential_id: id.clone(),
            source_ip: "203.0.113.9".to_string(),
            used_at: Utc::now(),
        })
        .unwrap();

    ctx.admin(&["token", "revoke", "--id", &id]).success();
    ctx.admin(&["user", "remove", "--username", "alice", "--yes"])
        .success();

    let usage = ctx.json(&["token", "usage", "--id", &id, "--json"]);
    assert_eq!(usage.as_array().unwrap().len(), 1);
    assert_eq!(usage[0]["source_ip"], "203.0.113.9");
}
