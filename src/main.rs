use tracing_subscriber::EnvFilter;

use cutlist_server::api::{build_router, ApiContext};
use cutlist_server::config::{self, AppConfig};
use cutlist_server::db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    tracing::info!(path = %config.database_path.display(), "Opening database");

    let conn = db::open_database(&config.database_path)?;
    let bind_addr = config.bind_addr;
    let router = build_router(ApiContext::new(conn, config));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router).await?;
    Ok(())
}
