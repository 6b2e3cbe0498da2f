use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use site_api::config::Config;
use site_api::db::Database;
use site_api::routes::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_api=info".parse()?),
        )
        .init();

    info!("Starting marketing site API");

    // Load configuration from environment
    let config = Arc::new(Config::from_env()?);

    // Open the content database (created on first run)
    let db = Database::connect(&config.database_path).await?;
    info!("Database ready at {}", config.database_path);

    let state = AppState {
        config: Arc::clone(&config),
        db,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
