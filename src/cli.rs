use clap::{Parser, Subcommand};

/// docrelay, a credential-gatekeeping relay for document stores
#[derive(Parser)]
#[command(name = "docrelay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Serve {
        /// Port to bind (overrides DOCRELAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage client API keys
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Manage registered projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Mint a new API key
    Create {
        #[arg(long)]
        name: String,
        /// Restrict the key to one project; omit for an unscoped key
        #[arg(long)]
        project_id: Option<String>,
    },
    /// List API keys
    List,
    /// Delete a key, revoking it immediately
    Revoke {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Register a backing project
    Add {
        #[arg(long)]
        name: String,
        /// Service credentials as an inline JSON string
        #[arg(long, conflicts_with = "credentials_file")]
        credentials: Option<String>,
        /// Path to a file holding the service credentials JSON
        #[arg(long)]
        credentials_file: Option<String>,
    },
    /// List registered projects
    List,
    /// Remove a project registration
    Remove {
        #[arg(long)]
        id: String,
    },
}
