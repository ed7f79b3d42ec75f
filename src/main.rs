use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use lab_catalogo::config::Config;
use lab_catalogo::logging;
use lab_catalogo::storage::CatalogStore;
use lab_catalogo::web::session::SessionStore;
use lab_catalogo::web::{self, AppState};

#[derive(Parser)]
#[command(name = "lab_catalogo")]
#[command(about = "Laboratory exam catalog web application")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Bind address override
        #[arg(long)]
        host: Option<String>,
        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(not(feature = "db"))]
async fn build_store() -> anyhow::Result<Arc<dyn CatalogStore>> {
    use lab_catalogo::storage::InMemoryStore;
    info!("Using in-memory store");
    Ok(Arc::new(InMemoryStore::new()))
}

#[cfg(feature = "db")]
async fn build_store() -> anyhow::Result<Arc<dyn CatalogStore>> {
    use lab_catalogo::storage::DatabaseStore;
    Ok(Arc::new(DatabaseStore::new().await?))
}

async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("{}; falling back to defaults", e);
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    });

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let secret = config.session_secret()?;
    let store = build_store().await?;
    let sessions = Arc::new(SessionStore::new(secret));

    let app = web::router(AppState { store, sessions });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Catalog service listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => serve(host, port).await,
    }
}
