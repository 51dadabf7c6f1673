//! Loads a tariff schedule CSV into the local tariff database.
//!
//! Usage: `import_hts [CSV_PATH]` (defaults to `data/sample_hts_data.csv`
//! under the project root).

use std::sync::Arc;

use anyhow::Context;

use hts_tariff_backend::core::config::{AppPaths, ConfigService};
use hts_tariff_backend::core::logging;
use hts_tariff_backend::tariff::{SqliteTariffStore, TariffService};

const DEFAULT_CSV: &str = "data/sample_hts_data.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let raw = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CSV.to_string());
    let csv_path = paths.resolve(&raw);

    let settings = ConfigService::new(paths.clone())
        .load_settings()
        .context("Failed to load configuration")?;
    let store = SqliteTariffStore::new(paths.as_ref())
        .await
        .with_context(|| format!("Failed to open {}", paths.tariff_db_path.display()))?;
    let service = TariffService::new(Arc::new(store), settings.tariff);

    let summary = service
        .import_csv_file(&csv_path)
        .await
        .with_context(|| format!("Failed to import {}", csv_path.display()))?;

    let stats = service.statistics().await?;
    tracing::info!(
        "Database now holds {} HTS products and {} countries",
        stats.total_hts_products,
        stats.total_countries
    );
    println!(
        "Import completed: {} imported, {} updated, {} errors ({} rows)",
        summary.imported, summary.updated, summary.errors, summary.total_processed
    );
    Ok(())
}
