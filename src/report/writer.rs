//! JSON report persistence.

use crate::core::{GovernanceConfig, SweepResult};
use crate::report::document::RunDocument;

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Returns the canonical path of a report document.
///
/// Documents are named `<prefix>_<YYYY-MM-DD>.json` inside the log
/// directory, one per prefix per day.
pub fn report_path(log_dir: &Path, file_prefix: &str, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{file_prefix}_{date}.json"))
}

/// Writes standardized report documents into the log directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    log_dir: PathBuf,
    server_url: String,
    log_only: bool,
}

impl ReportWriter {
    /// Creates a writer targeting the given directory.
    pub fn new(log_dir: impl Into<PathBuf>, server_url: impl Into<String>, log_only: bool) -> Self {
        Self {
            log_dir: log_dir.into(),
            server_url: server_url.into(),
            log_only,
        }
    }

    /// Creates a writer from the run's configuration.
    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self::new(&config.log_dir, &config.server_url, config.log_only)
    }

    /// Returns the log directory.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Writes one report document and returns the path written.
    ///
    /// The directory is created if absent. A document written twice on
    /// the same day for the same prefix overwrites the earlier one.
    pub async fn write<T: Serialize>(
        &self,
        items: &[T],
        file_prefix: &str,
        summary: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> SweepResult<PathBuf> {
        let mut document = RunDocument::new(items, summary, &self.server_url, self.log_only);
        document.extra = extra;

        let path = report_path(&self.log_dir, file_prefix, document.scan_date.date_naive());
        let body = serde_json::to_string_pretty(&document)?;

        tokio::fs::create_dir_all(&self.log_dir).await?;
        tokio::fs::write(&path, body).await?;

        tracing::info!(
            path = %path.display(),
            total_count = document.total_count,
            "report written"
        );

        Ok(path)
    }
}
