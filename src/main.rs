use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tollbooth::cli::{
    AdminCommands, RepoCommands, TeamCommands, TokenCommands, UserCommands, run_repo_add,
    run_repo_list, run_repo_remove, run_repo_visibility, run_team_add, run_team_add_member,
    run_team_members, run_team_remove, run_team_remove_member, run_token_create, run_token_list,
    run_token_revoke, run_token_usage, run_user_add, run_user_list, run_user_passwd,
    run_user_remove,
};
use tollbooth::config::ServerConfig;
use tollbooth::server::{AppState, create_router};
use tollbooth::store::{SqliteStore, Store};
use tollbooth::token::{JwtSigner, TokenIssuer};

#[derive(Parser)]
#[command(name = "tollbooth")]
#[command(about = "Container registry token service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the token server
    Serve {
        /// TOML configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("tollbooth.db");
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!();
    println!("Initialized database at {}", db_path.display());
    println!();

    Ok(())
}

async fn run_serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!(
            "Server not initialized. Run 'tollbooth admin init' first to create the database."
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    let signer = JwtSigner::from_config(&config.token)?;
    let issuer = TokenIssuer::new(config.token.issuer.clone(), Arc::new(signer));

    info!(
        issuer = %config.token.issuer,
        service = %config.token.service,
        password_login = config.auth.allow_password,
        "Token service configured"
    );

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(Arc::new(store), issuer, config));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tollbooth=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(data_dir)?,
            AdminCommands::User { command } => match command {
                UserCommands::Add {
                    data_dir,
                    username,
                    admin,
                    password,
                    password_stdin,
                } => run_user_add(data_dir, username, admin, password, password_stdin)?,
                UserCommands::Passwd {
                    data_dir,
                    username,
                    password_stdin,
                    clear,
                } => run_user_passwd(data_dir, username, password_stdin, clear)?,
                UserCommands::List { data_dir, json } => run_user_list(data_dir, json)?,
                UserCommands::Remove {
                    data_dir,
                    username,
                    yes,
                } => run_user_remove(data_dir, username, yes)?,
            },
            AdminCommands::Team { command } => match command {
                TeamCommands::Add {
                    data_dir,
                    name,
                    owner,
                } => run_team_add(data_dir, name, owner)?,
                TeamCommands::AddMember {
                    data_dir,
                    team,
                    username,
                    admin,
                } => run_team_add_member(data_dir, team, username, admin)?,
                TeamCommands::RemoveMember {
                    data_dir,
                    team,
                    username,
                } => run_team_remove_member(data_dir, team, username)?,
                TeamCommands::Remove {
                    data_dir,
                    name,
                    yes,
                } => run_team_remove(data_dir, name, yes)?,
                TeamCommands::Members { data_dir, team } => run_team_members(data_dir, team)?,
            },
            AdminCommands::Repo { command } => match command {
                RepoCommands::Add {
                    data_dir,
                    name,
                    public,
                } => run_repo_add(data_dir, name, public)?,
                RepoCommands::Visibility {
                    data_dir,
                    name,
                    visibility,
                } => run_repo_visibility(data_dir, name, visibility)?,
                RepoCommands::List {
                    data_dir,
                    namespace,
                } => run_repo_list(data_dir, namespace)?,
                RepoCommands::Remove { data_dir, name } => run_repo_remove(data_dir, name)?,
            },
            AdminCommands::Token { command } => match command {
                TokenCommands::Create {
                    data_dir,
                    username,
                    permission,
                    expires_days,
                    description,
                } => run_token_create(data_dir, username, permission, expires_days, description)?,
                TokenCommands::List {
                    data_dir,
                    username,
                    json,
                } => run_token_list(data_dir, username, json)?,
                TokenCommands::Revoke { data_dir, id } => run_token_revoke(data_dir, id)?,
                TokenCommands::Usage { data_dir, id, json } => run_token_usage(data_dir, id, json)?,
            },
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => run_serve(config, host, port, data_dir).await?,
    }

    Ok(())
}
