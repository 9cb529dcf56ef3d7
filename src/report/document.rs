//! The standardized report document shape.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The JSON document persisted once per sweep.
///
/// Extra metadata (per-site breakdowns, threshold values, status
/// summaries) is flattened to the top level so downstream consumers see
/// one flat object followed by the full `items` sequence.
#[derive(Debug, Clone, Serialize)]
pub struct RunDocument<'a, T> {
    /// Human-readable one-line summary of the run.
    pub summary: String,

    /// Number of items in the document.
    pub total_count: usize,

    /// When the scan ran (ISO-8601).
    pub scan_date: DateTime<Utc>,

    /// Server the scan ran against.
    pub server_url: String,

    /// Whether the run was report-only (always true in practice; recorded
    /// so operators can audit the mode).
    pub log_only_mode: bool,

    /// Additional metadata keys, flattened to the top level.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,

    /// The full result sequence.
    pub items: &'a [T],
}

impl<'a, T: Serialize> RunDocument<'a, T> {
    /// Builds a document over the given items.
    pub fn new(
        items: &'a [T],
        summary: impl Into<String>,
        server_url: impl Into<String>,
        log_only_mode: bool,
    ) -> Self {
        Self {
            summary: summary.into(),
            total_count: items.len(),
            scan_date: Utc::now(),
            server_url: server_url.into(),
            log_only_mode,
            extra: serde_json::Map::new(),
            items,
        }
    }

    /// Adds a metadata entry, flattened into the top-level object.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
