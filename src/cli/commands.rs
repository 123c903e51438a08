use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory and database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage teams and their members
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },

    /// Manage repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Manage personal access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user and its namespace
    Add {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username (also the namespace name)
        #[arg(long)]
        username: String,

        /// Give the user the admin role
        #[arg(long)]
        admin: bool,

        /// Prompt for a login password
        #[arg(long, conflicts_with = "password_stdin")]
        password: bool,

        /// Read the login password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Set or clear a user's login password
    Passwd {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        username: String,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,

        /// Remove the password, disabling password login
        #[arg(long, conflicts_with = "password_stdin")]
        clear: bool,
    },

    /// List users
    List {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a user, its namespace, repositories and tokens
    Remove {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        username: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TeamCommands {
    /// Create a team; the owner becomes its first admin member
    Add {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Team name (also the namespace name)
        #[arg(long)]
        name: String,

        /// Username of the first team admin
        #[arg(long)]
        owner: String,
    },

    /// Add a user to a team
    AddMember {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        team: String,

        #[arg(long)]
        username: String,

        /// Make the member a team admin
        #[arg(long)]
        admin: bool,
    },

    /// Remove a user from a team
    RemoveMember {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        team: String,

        #[arg(long)]
        username: String,
    },

    /// Delete a team, its namespace and repositories
    Remove {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List team members
    Members {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        team: String,
    },
}

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Create a repository as <namespace>/<name>
    Add {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Full repository name, e.g. alice/app
        name: String,

        /// Allow anonymous pulls
        #[arg(long)]
        public: bool,
    },

    /// Change repository visibility
    Visibility {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        name: String,

        /// "public" or "private"
        visibility: String,
    },

    /// List repositories in a namespace
    List {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        namespace: String,
    },

    /// Delete a repository
    Remove {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        name: String,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create a personal access token; the raw token is printed once
    Create {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        username: String,

        /// readOnly, readWrite or readWriteDelete
        #[arg(long, default_value = "readOnly")]
        permission: String,

        /// Token lifetime in days
        #[arg(long, default_value = "30")]
        expires_days: i64,

        #[arg(long)]
        description: Option<String>,
    },

    /// List a user's tokens
    List {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        username: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a token by id
    Revoke {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        id: String,
    },

    /// Show the usage log of a token
    Usage {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
