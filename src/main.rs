use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docrelay::cli::{self, Cli, Commands};
use docrelay::config::{self, Config};
use docrelay::store::{Connector, HttpConnector, ServiceCredentials};
use docrelay::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "docrelay=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(Commands::Key { command }) => {
            let state = bootstrap(cfg).await?;
            handle_key_command(command, &state).await
        }
        Some(Commands::Project { command }) => {
            let state = bootstrap(cfg).await?;
            handle_project_command(command, &state).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Open the management project session and assemble shared state.
async fn bootstrap(cfg: Config) -> anyhow::Result<Arc<AppState>> {
    let raw = cfg.management_credentials()?;
    let creds = ServiceCredentials::parse(raw).context("DOCRELAY_MANAGEMENT_CREDENTIALS")?;

    let connector = Arc::new(HttpConnector::new());
    let management = connector
        .connect(&creds)
        .await
        .context("failed to connect to the management project")?;

    Ok(Arc::new(AppState::new(cfg, management, connector)))
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to management project...");
    let state = bootstrap(cfg).await?;

    if state.config.admin_secret.is_none() {
        tracing::warn!("DOCRELAY_ADMIN_SECRET is not set; the admin API will reject all requests");
    }

    let app = docrelay::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("docrelay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_key_command(cmd: cli::KeyCommands, state: &Arc<AppState>) -> anyhow::Result<()> {
    match cmd {
        cli::KeyCommands::Create { name, project_id } => {
            if project_id.is_none() && state.config.default_project.is_none() {
                anyhow::bail!("--project-id is required when no default project is configured");
            }
            let created = state.keys.create(&name, project_id).await?;
            println!("API key created:");
            println!("  ID:      {}", created.id);
            println!("  Name:    {}", created.name);
            println!("  Key:     {}", created.key);
            if let Some(project) = &created.project_id {
                println!("  Project: {}", project);
            }
        }
        cli::KeyCommands::List => {
            let keys = state.keys.list().await?;
            if keys.is_empty() {
                println!("No API keys found.");
            } else {
                println!("{:<34} {:<20} {:<16} CREATED", "ID", "NAME", "PROJECT");
                for k in keys {
                    println!(
                        "{:<34} {:<20} {:<16} {}",
                        k.id,
                        k.name,
                        k.project_id.as_deref().unwrap_or("-"),
                        k.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
        cli::KeyCommands::Revoke { id } => {
            state.keys.delete(&id).await?;
            println!("Key revoked.");
        }
    }
    Ok(())
}

async fn handle_project_command(
    cmd: cli::ProjectCommands,
    state: &Arc<AppState>,
) -> anyhow::Result<()> {
    match cmd {
        cli::ProjectCommands::Add {
            name,
            credentials,
            credentials_file,
        } => {
            let raw = match (credentials, credentials_file) {
                (Some(json), _) => json,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path))?,
                (None, None) => anyhow::bail!("provide --credentials or --credentials-file"),
            };
            let creds = ServiceCredentials::parse(&raw)?;
            let summary = state.registry.create(&creds.project_id, &name, &raw).await?;
            println!("Project registered:");
            println!("  ID:   {}", summary.id);
            println!("  Name: {}", summary.name);
        }
        cli::ProjectCommands::List => {
            let projects = state.registry.list().await?;
            if projects.is_empty() {
                println!("No projects registered.");
            } else {
                println!("{:<24} NAME", "ID");
                for p in projects {
                    println!("{:<24} {}", p.id, p.name);
                }
            }
        }
        cli::ProjectCommands::Remove { id } => {
            state.registry.delete(&id).await?;
            println!("Project removed.");
        }
    }
    Ok(())
}
