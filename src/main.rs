use tracing_subscriber::EnvFilter;

use careledger::api::{api_router, ApiContext};
use careledger::config;
use careledger::db::sqlite::open_database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Migrations run here, before the server accepts requests
    let conn = open_database(&db_path)?;
    tracing::info!("database ready at {}", db_path.display());

    let app = api_router(ApiContext::new(conn));

    let addr = config::listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
