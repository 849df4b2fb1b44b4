pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;
use db::Store;
use state::SharedState;

#[derive(Parser)]
#[command(name = "snapnest")]
#[command(author, version, about = "Event photo sharing backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create a default config file
    Init,

    /// Grant the admin flag to an existing account
    GrantAdmin {
        /// Email of the account to promote
        email: String,
    },

    /// Remove the admin flag from an account
    RevokeAdmin {
        /// Email of the account to demote
        email: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Commands::GrantAdmin { email } => set_admin_flag(&config, &email, true).await,

        Commands::RevokeAdmin { email } => set_admin_flag(&config, &email, false).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "snapnest")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Snapnest v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let maintenance_enabled = config.maintenance.enabled;

    let shared = Arc::new(SharedState::new(config).await?);

    let scheduler = if maintenance_enabled {
        Some(scheduler::start(Arc::clone(&shared)).await?)
    } else {
        None
    };

    let state = api::create_app_state(shared, prometheus_handle).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {e}");
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    server.abort();
    if let Some(mut scheduler) = scheduler {
        scheduler.shutdown().await.ok();
    }
    info!("Stopped");

    Ok(())
}

async fn set_admin_flag(config: &Config, email: &str, is_admin: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if store.set_admin_by_email(email, is_admin).await? {
        let verb = if is_admin { "granted to" } else { "revoked from" };
        println!("✓ Admin flag {verb} {email}");
    } else {
        println!("No account found for {email}. The user must sign in once first.");
    }

    Ok(())
}
