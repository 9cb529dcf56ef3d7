//! Inactive user sweep across every site.
//!
//! This example shows how to:
//! - Load and validate configuration
//! - Build a SweepCoordinator over the REST client
//! - Run the stale-user scanner and persist the report
//!
//! Run with: cargo run --example stale_users

use sitesweep::prelude::*;
use sitesweep::scanners::count_by_site;

use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Multi-Site Inactive User Sweep ===\n");

    // Credentials come from the environment (SITESWEEP_* variables),
    // falling back to sweep_config.json for the rest.
    let config = GovernanceConfig::from_file("sweep_config.json")?;
    config.validate()?;

    println!("Server: {}", config.server_url);
    println!("Threshold: {} days without sign-in", config.stale_user_days);
    // Reporting is the only implemented mode; the flag is surfaced so
    // operators can audit it.
    println!("Mode: {}\n", if config.log_only { "LOG ONLY" } else { "LOG ONLY (cleanup requested but not implemented)" });

    let client = Arc::new(RestClient::new(RestConfig::new(&config.server_url))?);

    let coordinator = SweepCoordinator::builder()
        .client(client)
        .config(config.clone())
        .build()?;

    let scanner = StaleUserScanner::new(config.stale_user_days);
    let outcome = coordinator.run(&scanner).await?;

    // Per-site breakdown for the report metadata.
    let sites_summary = count_by_site(&outcome.items);

    let writer = ReportWriter::from_config(&config);
    let summary = format!("{} inactive users found", outcome.items.len());

    let mut extra = serde_json::Map::new();
    extra.insert("threshold_days".into(), json!(config.stale_user_days));
    extra.insert("sites_summary".into(), json!(sites_summary));
    extra.insert("skipped_sites".into(), json!(outcome.skipped_sites));

    let path = writer
        .write(&outcome.items, "inactive_users", &summary, extra)
        .await?;

    println!("\n=== Sweep Results ===");
    println!("Inactive users: {}", outcome.items.len());
    println!("Sites scanned: {}", outcome.sites_scanned);
    if !outcome.is_complete() {
        println!("Sites skipped: {}", outcome.skipped_sites.join(", "));
    }
    println!("Report written to: {}", path.display());

    for (site, count) in &sites_summary {
        println!("  - {site}: {count} inactive users");
    }

    Ok(())
}
