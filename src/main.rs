//! Keeper - Personal AI assistant that remembers information and breaks
//! tasks into steps

use anyhow::Result;
use clap::{Parser, Subcommand};
use keeper::{
    agent::GeminiRuntime,
    api::{build_app, AppState},
    config::KeeperConfig,
    gateway::ChatGateway,
    ingest::{IngestToolkit, IngestionDispatcher},
    timeline::TimelineStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "keeper")]
#[command(author = "Keeper Team")]
#[command(version)]
#[command(about = "Personal AI assistant that remembers information and breaks tasks into steps")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "KEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Keeper API server
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ingest a task and its steps directly, without the reasoning agent
    Task {
        /// User the task belongs to
        #[arg(short, long)]
        user: String,

        /// The task to ingest
        task: String,

        /// Task steps, in order (repeatable)
        #[arg(short, long = "step", required = true)]
        steps: Vec<String>,
    },

    /// Ingest a piece of information directly, without the reasoning agent
    Info {
        /// User the information belongs to
        #[arg(short, long)]
        user: String,

        /// The information to remember
        information: String,
    },

    /// Print a user's stored timeline as JSON
    Timeline {
        /// User to look up
        #[arg(short, long)]
        user: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("keeper={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        KeeperConfig::load(config_path)?
    } else {
        KeeperConfig::default()
    };

    match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await?,
        Commands::Task { user, task, steps } => run_task(config, &user, &task, steps).await?,
        Commands::Info { user, information } => run_info(config, &user, &information).await?,
        Commands::Timeline { user } => run_timeline(config, &user).await?,
        Commands::Config { default } => {
            let shown = if default {
                KeeperConfig::default()
            } else {
                config
            };
            println!("{}", shown.to_toml()?);
        }
    }

    Ok(())
}

async fn run_serve(config: KeeperConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let store = Arc::new(TimelineStore::new(config.storage.base_dir.clone()).await?);
    let dispatcher = IngestionDispatcher::new(store.clone());
    let toolkit = Arc::new(IngestToolkit::new(dispatcher));
    let runtime = Arc::new(GeminiRuntime::new(&config.agent, toolkit)?);
    let gateway = Arc::new(ChatGateway::new(runtime));

    let state = AppState {
        gateway,
        store,
        default_user: config.server.default_user.clone(),
    };
    let app = build_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(%host, port, model = %config.agent.model, "Keeper API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn run_task(config: KeeperConfig, user: &str, task: &str, steps: Vec<String>) -> Result<()> {
    let store = Arc::new(TimelineStore::new(config.storage.base_dir.clone()).await?);
    let dispatcher = IngestionDispatcher::new(store);

    let confirmation = dispatcher.ingest_task(user, task, &steps).await?;
    println!("{}", confirmation);
    Ok(())
}

async fn run_info(config: KeeperConfig, user: &str, information: &str) -> Result<()> {
    let store = Arc::new(TimelineStore::new(config.storage.base_dir.clone()).await?);
    let dispatcher = IngestionDispatcher::new(store);

    let confirmation = dispatcher.ingest_information(user, information).await?;
    println!("{}", confirmation);
    Ok(())
}

async fn run_timeline(config: KeeperConfig, user: &str) -> Result<()> {
    let store = TimelineStore::new(config.storage.base_dir.clone()).await?;
    match store.load_timeline(user).await {
        Some(timeline) => println!("{}", serde_json::to_string_pretty(&timeline)?),
        None => println!("No timeline for user '{}'", user),
    }
    Ok(())
}
