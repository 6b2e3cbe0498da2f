use anyhow::{Context, Result};
use std::fs;
use tracing::info;

use site_api::config::Config;
use site_api::db::Database;
use site_api::routes::{bulk_upsert_translations, TranslationPayload};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("import_translations=info".parse()?),
        )
        .init();

    let input_path = std::env::args()
        .nth(1)
        .context("Usage: import-translations <translations.json>")?;

    info!("Importing translations from {}", input_path);

    let raw = fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read {}", input_path))?;
    let entries: Vec<TranslationPayload> =
        serde_json::from_str(&raw).context("Input must be a JSON array of translation entries")?;

    let config = Config::from_env()?;
    let db = Database::connect(&config.database_path).await?;

    // Entries fail independently; the rest of the batch still lands.
    let report = bulk_upsert_translations(&db, &entries).await;

    for error in &report.errors {
        info!("Skipped: {}", error);
    }
    info!(
        "✓ Imported {} of {} entries ({} skipped)",
        report.imported,
        entries.len(),
        report.skipped
    );

    Ok(())
}
