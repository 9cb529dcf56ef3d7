//! Stale content detection for workbooks and datasources.

use crate::client::Session;
use crate::core::{Site, SweepResult};
use crate::scanners::{SiteScanner, SiteStamped};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of content item flagged by the content scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A workbook.
    Workbook,
    /// A published datasource.
    Datasource,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workbook => write!(f, "workbook"),
            Self::Datasource => write!(f, "datasource"),
        }
    }
}

/// A content item flagged as stale on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleContentRecord {
    /// Display name of the item.
    pub name: String,

    /// Whether the item is a workbook or a datasource.
    pub kind: ContentKind,

    /// Name of the containing project.
    pub project: String,

    /// Identifier of the owning user.
    pub owner_id: String,

    /// URL path segment of the item, if known.
    pub content_url: Option<String>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,

    /// Whole days since the last update.
    pub days_stale: i64,

    /// Size in megabytes, rounded to two decimals; zero when unreported.
    pub size_mb: f64,

    /// Total view count (workbooks only).
    pub view_count: Option<u64>,

    /// Name of the originating site.
    pub site_name: String,

    /// Identifier of the originating site.
    pub site_id: String,

    /// Content URL of the originating site ("default" for the default site).
    pub site_content_url: String,
}

impl SiteStamped for StaleContentRecord {
    fn site_name(&self) -> &str {
        &self.site_name
    }
}

/// Counts flagged records per content kind.
pub fn count_by_kind(records: &[StaleContentRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.kind.to_string()).or_insert(0) += 1;
    }
    counts
}

fn size_mb(size_bytes: Option<u64>) -> f64 {
    let bytes = size_bytes.unwrap_or(0) as f64;
    (bytes / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Flags workbooks and datasources not updated within the staleness
/// threshold.
///
/// Both kinds flow into one record sequence, workbooks first, matching
/// the listing order of the underlying calls.
#[derive(Debug, Clone)]
pub struct StaleContentScanner {
    threshold_days: u32,
    reference_time: DateTime<Utc>,
}

impl StaleContentScanner {
    /// Creates a scanner flagging content stale for `threshold_days`.
    pub fn new(threshold_days: u32) -> Self {
        Self {
            threshold_days,
            reference_time: Utc::now(),
        }
    }

    /// Overrides the reference time the threshold is measured from.
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.reference_time - Duration::days(i64::from(self.threshold_days))
    }

    fn record(
        &self,
        site: &Site,
        kind: ContentKind,
        name: String,
        project: Option<String>,
        owner_id: String,
        content_url: Option<String>,
        updated_at: DateTime<Utc>,
        size_bytes: Option<u64>,
        view_count: Option<u64>,
    ) -> StaleContentRecord {
        StaleContentRecord {
            name,
            kind,
            project: project.unwrap_or_else(|| "Unknown".to_string()),
            owner_id,
            content_url,
            updated_at,
            days_stale: (self.reference_time - updated_at).num_days(),
            size_mb: size_mb(size_bytes),
            view_count,
            site_name: site.name.clone(),
            site_id: site.id.clone(),
            site_content_url: site.content_url_or_default().to_string(),
        }
    }
}

#[async_trait]
impl SiteScanner for StaleContentScanner {
    type Record = StaleContentRecord;

    fn resource_name(&self) -> &str {
        "content"
    }

    async fn scan(&self, session: &Session, site: &Site) -> SweepResult<Vec<StaleContentRecord>> {
        let cutoff = self.cutoff();
        let mut records = Vec::new();

        for workbook in session.list_workbooks().await? {
            let Some(updated_at) = workbook.updated_at else {
                continue;
            };
            if updated_at < cutoff {
                records.push(self.record(
                    site,
                    ContentKind::Workbook,
                    workbook.name,
                    workbook.project,
                    workbook.owner_id,
                    workbook.content_url,
                    updated_at,
                    workbook.size_bytes,
                    workbook.view_count,
                ));
            }
        }

        for datasource in session.list_datasources().await? {
            let Some(updated_at) = datasource.updated_at else {
                continue;
            };
            if updated_at < cutoff {
                records.push(self.record(
                    site,
                    ContentKind::Datasource,
                    datasource.name,
                    datasource.project,
                    datasource.owner_id,
                    datasource.content_url,
                    updated_at,
                    datasource.size_bytes,
                    None,
                ));
            }
        }

        Ok(records)
    }
}
