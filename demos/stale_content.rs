//! Stale content sweep across every site.
//!
//! This example shows how to:
//! - Run the content scanner over workbooks and datasources
//! - Populate per-site and per-kind report metadata
//! - Compose the daily plain-text summary afterwards
//!
//! Run with: cargo run --example stale_content

use sitesweep::prelude::*;
use sitesweep::scanners::{count_by_kind, count_by_site};

use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Multi-Site Stale Content Sweep ===\n");

    let config = GovernanceConfig::from_file("sweep_config.json")?;
    config.validate()?;

    let client = Arc::new(RestClient::new(RestConfig::new(&config.server_url))?);

    let coordinator = SweepCoordinator::builder()
        .client(client)
        .config(config.clone())
        .build()?;

    let scanner = StaleContentScanner::new(config.stale_content_days);
    let outcome = coordinator.run(&scanner).await?;

    let sites_summary = count_by_site(&outcome.items);
    let kind_summary = count_by_kind(&outcome.items);

    let writer = ReportWriter::from_config(&config);
    let summary = format!("{} stale content items found", outcome.items.len());

    let mut extra = serde_json::Map::new();
    extra.insert("threshold_days".into(), json!(config.stale_content_days));
    extra.insert("sites_summary".into(), json!(sites_summary));
    extra.insert("type_summary".into(), json!(kind_summary));
    extra.insert("skipped_sites".into(), json!(outcome.skipped_sites));

    let path = writer
        .write(&outcome.items, "stale_content", &summary, extra)
        .await?;

    println!("\n=== Sweep Results ===");
    println!("Stale content items: {}", outcome.items.len());
    println!(
        "Criteria: {} days without updates",
        config.stale_content_days
    );
    println!("Report written to: {}", path.display());

    for (kind, count) in &kind_summary {
        println!("  - {kind}s: {count}");
    }

    // Roll the day's reports up into the delivery summary.
    let summary_path =
        compose_daily_summary(&config.log_dir, chrono::Utc::now().date_naive()).await?;
    println!("Daily summary written to: {}", summary_path.display());

    Ok(())
}
