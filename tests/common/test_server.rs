use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use tollbooth::auth::SecretHasher;
use tollbooth::config::ServerConfig;
use tollbooth::server::{AppState, create_router};
use tollbooth::store::{SqliteStore, Store};
use tollbooth::token::{Claims, JwtSigner, TokenIssuer};
use tollbooth::types::{
    AccessCredential, PermissionLevel, Repository, Role, Team, TeamMember, User, Visibility,
};

pub const SERVICE: &str = "container-registry";
const SECRET: &[u8] = b"integration-signing-secret";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub www_authenticate: Option<String>,
    pub body: Value,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    pub fn start_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let mut config = ServerConfig::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.token.service = SERVICE.to_string();
        configure(&mut config);

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");

        let signer = JwtSigner::new(Algorithm::HS256, EncodingKey::from_secret(SECRET), None);
        let issuer = TokenIssuer::new(config.token.issuer.clone(), Arc::new(signer));
        let state = Arc::new(AppState::new(store.clone(), issuer, config));

        Self {
            temp_dir,
            store,
            router: create_router(state),
        }
    }

    pub fn add_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role: Role::User,
            namespace_id: Uuid::new_v4().to_string(),
            password_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.store.create_user(&user).expect("create user");
        user
    }

    pub fn set_password(&self, user: &User, password: &str) {
        let hash = SecretHasher::new().hash(password).expect("hash password");
        self.store
            .set_user_password(&user.id, Some(&hash))
            .expect("set password");
    }

    pub fn add_team(&self, name: &str, members: &[&User]) -> Team {
        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            namespace_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        self.store.create_team(&team).expect("create team");
        for user in members {
            self.store
                .add_team_member(&TeamMember {
                    team_id: team.id.clone(),
                    user_id: user.id.clone(),
                    role: Role::User,
                    created_at: Utc::now(),
                })
                .expect("add team member");
        }
        team
    }

    pub fn add_repo(&self, namespace: &str, name: &str, visibility: Visibility) -> Repository {
        let ns = self
            .store
            .get_namespace_by_name(namespace)
            .expect("query namespace")
            .expect("namespace exists");
        let now = Utc::now();
        let repo = Repository {
            id: Uuid::new_v4().to_string(),
            namespace_id: ns.id,
            name: name.to_string(),
            visibility,
            created_at: now,
            updated_at: now,
        };
        self.store.create_repository(&repo).expect("create repository");
        repo
    }

    /// Creates a credential and returns it with its raw token.
    pub fn add_token(
        &self,
        user: &User,
        permission: PermissionLevel,
        expires_in: Duration,
    ) -> (AccessCredential, String) {
        let issued = SecretHasher::new().issue_token().expect("issue token");
        let now = Utc::now();
        let credential = AccessCredential {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            description: None,
            permission,
            created_at: now,
            expires_at: now + expires_in,
        };
        self.store
            .create_credential(&credential)
            .expect("create credential");
        (credential, issued.raw)
    }

    pub async fn get(&self, uri: &str, basic: Option<(&str, &str)>) -> TestResponse {
        self.send("GET", uri, basic, &[]).await
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        basic: Option<(&str, &str)>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, secret)) = basic {
            let encoded = STANDARD.encode(format!("{username}:{secret}"));
            builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let mut request = builder.body(Body::empty()).expect("build request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40000))));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");

        let status = response.status();
        let www_authenticate = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().expect("header is ascii").to_string());
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            www_authenticate,
            body,
        }
    }
}

pub fn decode_claims(token: &str) -> Claims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SERVICE]);
    validation.set_issuer(&["tollbooth"]);
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .expect("decode token")
        .claims
}
