use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use postdesk::app::{router, AppState, Gateways};
use postdesk::config::AppConfig;

#[derive(Parser)]
#[command(name = "postdesk", version, about = "Blog post backend with search index sync")]
struct Cli {
    /// Optional configuration file, layered under `POSTDESK_*` variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default).
    Serve,
    /// Reconcile every post with the search index, then exit.
    Reindex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postdesk=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::info!(mode = ?config.mode(), "Starting postdesk...");

    let gateways = Gateways::connect(&config).await?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, &gateways).await,
        Command::Reindex => reindex(&config, &gateways).await,
    };

    gateways.close().await;
    result
}

async fn serve(config: &AppConfig, gateways: &Gateways) -> anyhow::Result<()> {
    if config.mode().is_production() {
        gateways.index.configure_index().await?;
        tracing::info!("Search index configured");
    }

    let state = AppState {
        posts: Arc::new(gateways.repository(config)),
        topics: gateways.topics.clone(),
    };
    let app = router(state);

    tracing::info!("Listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn reindex(config: &AppConfig, gateways: &Gateways) -> anyhow::Result<()> {
    if !config.mode().is_production() {
        tracing::warn!("Not in production mode, reindex will not touch the search index");
    }

    let report = gateways.repository(config).reindex().await?;
    if report.failed > 0 {
        anyhow::bail!("{} post(s) could not be reconciled", report.failed);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
