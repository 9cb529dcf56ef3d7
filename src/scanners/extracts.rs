//! Extract refresh schedule analysis.
//!
//! Joins each site's extract-refresh tasks against its schedule list and
//! classifies when the refresh runs relative to peak business hours, so
//! operators can move heavy refreshes off the busy window.

use crate::client::Session;
use crate::core::{Schedule, Site, SweepResult};
use crate::scanners::{SiteScanner, SiteStamped};

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// First hour of the peak business window (inclusive).
pub const PEAK_START_HOUR: u32 = 8;
/// Last hour of the peak business window (inclusive).
pub const PEAK_END_HOUR: u32 = 18;

/// When a schedule runs relative to peak business hours.
///
/// Classification is derived from the schedule's reported start time;
/// when the server does not expose one, the window is `Unknown` rather
/// than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakWindow {
    /// Starts inside the peak window (08:00-18:00).
    Peak,
    /// Starts outside the peak window.
    OffPeak,
    /// The schedule or its start time is unavailable.
    Unknown,
}

impl PeakWindow {
    /// Classifies a start hour (24-hour clock).
    pub fn from_hour(hour: u32) -> Self {
        if (PEAK_START_HOUR..=PEAK_END_HOUR).contains(&hour) {
            Self::Peak
        } else {
            Self::OffPeak
        }
    }

    /// Classifies a schedule by its reported start time.
    pub fn from_schedule(schedule: Option<&Schedule>) -> Self {
        match schedule.and_then(|s| s.start_time) {
            Some(start) => Self::from_hour(start.hour()),
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for PeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peak => write!(f, "peak"),
            Self::OffPeak => write!(f, "off_peak"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An extract-refresh task flagged on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTaskRecord {
    /// Identifier of the task.
    pub task_id: String,

    /// Identifier of the driving schedule, if any.
    pub schedule_id: Option<String>,

    /// Name of the driving schedule, when resolvable.
    pub schedule_name: Option<String>,

    /// Lifecycle state of the schedule, when resolvable.
    pub schedule_state: Option<String>,

    /// Recurrence kind of the schedule, when resolvable.
    pub schedule_kind: Option<String>,

    /// Type of the refresh target ("workbook" or "datasource").
    pub target_type: Option<String>,

    /// Name of the refresh target.
    pub target_name: Option<String>,

    /// When the refresh runs relative to peak business hours.
    pub peak_window: PeakWindow,

    /// Refresh priority (lower runs first).
    pub priority: u32,

    /// When the task was created.
    pub created_at: Option<DateTime<Utc>>,

    /// Name of the originating site.
    pub site_name: String,

    /// Identifier of the originating site.
    pub site_id: String,

    /// Content URL of the originating site ("default" for the default site).
    pub site_content_url: String,
}

impl SiteStamped for ExtractTaskRecord {
    fn site_name(&self) -> &str {
        &self.site_name
    }
}

/// Tallies records per peak window, in window order.
pub fn count_by_window(records: &[ExtractTaskRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.peak_window.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Tallies records per schedule kind, in kind order.
pub fn count_by_schedule_kind(records: &[ExtractTaskRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let kind = record
            .schedule_kind
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

/// Collects every extract-refresh task with its schedule context.
///
/// Unlike the staleness scanners this one has no threshold: every task is
/// reported, and the peak-window field carries the signal.
#[derive(Debug, Clone, Default)]
pub struct ExtractTaskScanner;

impl ExtractTaskScanner {
    /// Creates the scanner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteScanner for ExtractTaskScanner {
    type Record = ExtractTaskRecord;

    fn resource_name(&self) -> &str {
        "extract tasks"
    }

    async fn scan(&self, session: &Session, site: &Site) -> SweepResult<Vec<ExtractTaskRecord>> {
        let tasks = session.list_tasks().await?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let schedules: HashMap<String, Schedule> = session
            .list_schedules()
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let records = tasks
            .into_iter()
            .map(|task| {
                let schedule = task
                    .schedule_id
                    .as_ref()
                    .and_then(|id| schedules.get(id));

                ExtractTaskRecord {
                    task_id: task.id,
                    schedule_id: task.schedule_id,
                    schedule_name: schedule.map(|s| s.name.clone()),
                    schedule_state: schedule.map(|s| s.state.clone()),
                    schedule_kind: schedule.map(|s| s.kind.clone()),
                    target_type: task.target_type,
                    target_name: task.target_name,
                    peak_window: PeakWindow::from_schedule(schedule),
                    priority: task.priority,
                    created_at: task.created_at,
                    site_name: site.name.clone(),
                    site_id: site.id.clone(),
                    site_content_url: site.content_url_or_default().to_string(),
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopSink;
    use crate::client::{MockServer, Session};
    use crate::core::{Credentials, ExtractTask};
    use crate::retry::{RetryExecutor, RetryPolicy};
    use chrono::NaiveTime;
    use std::sync::Arc;

    fn task(id: &str, schedule_id: Option<&str>) -> ExtractTask {
        ExtractTask {
            id: id.to_string(),
            schedule_id: schedule_id.map(String::from),
            priority: 50,
            target_type: Some("workbook".into()),
            target_name: Some("Sales".into()),
            created_at: None,
        }
    }

    fn schedule(id: &str, start_hour: Option<u32>) -> Schedule {
        Schedule {
            id: id.to_string(),
            name: format!("schedule-{id}"),
            state: "Active".into(),
            kind: "Daily".into(),
            start_time: start_hour.map(|h| NaiveTime::from_hms_opt(h, 0, 0).unwrap()),
        }
    }

    async fn scan_with(server: MockServer) -> Vec<ExtractTaskRecord> {
        let site = MockServer::site("s1", "Finance");
        let server = Arc::new(server.with_site(site.clone()));
        let executor = RetryExecutor::new(RetryPolicy::no_retry(), Arc::new(NoopSink));
        let mut session = Session::establish(server, &Credentials::new("t", "s"), executor)
            .await
            .unwrap();
        session.switch_site(&site).await.unwrap();

        let records = ExtractTaskScanner::new().scan(&session, &site).await.unwrap();
        session.close().await.unwrap();
        records
    }

    #[test]
    fn test_peak_window_from_hour() {
        assert_eq!(PeakWindow::from_hour(8), PeakWindow::Peak);
        assert_eq!(PeakWindow::from_hour(18), PeakWindow::Peak);
        assert_eq!(PeakWindow::from_hour(7), PeakWindow::OffPeak);
        assert_eq!(PeakWindow::from_hour(19), PeakWindow::OffPeak);
        assert_eq!(PeakWindow::from_hour(0), PeakWindow::OffPeak);
    }

    #[tokio::test]
    async fn test_classifies_from_schedule_start() {
        let server = MockServer::new()
            .with_tasks(
                "s1",
                vec![task("t1", Some("sch-day")), task("t2", Some("sch-night"))],
            )
            .with_schedules(
                "s1",
                vec![schedule("sch-day", Some(9)), schedule("sch-night", Some(20))],
            );

        let records = scan_with(server).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].peak_window, PeakWindow::Peak);
        assert_eq!(records[0].schedule_name.as_deref(), Some("schedule-sch-day"));
        assert_eq!(records[1].peak_window, PeakWindow::OffPeak);
    }

    #[tokio::test]
    async fn test_missing_schedule_is_unknown() {
        let server = MockServer::new().with_tasks(
            "s1",
            vec![task("t1", Some("gone")), task("t2", None)],
        );

        let records = scan_with(server).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].peak_window, PeakWindow::Unknown);
        assert!(records[0].schedule_name.is_none());
        assert_eq!(records[1].peak_window, PeakWindow::Unknown);
    }

    #[tokio::test]
    async fn test_schedule_without_start_time_is_unknown() {
        let server = MockServer::new()
            .with_tasks("s1", vec![task("t1", Some("sch"))])
            .with_schedules("s1", vec![schedule("sch", None)]);

        let records = scan_with(server).await;

        assert_eq!(records[0].peak_window, PeakWindow::Unknown);
        // Schedule metadata still resolves even without a start time.
        assert_eq!(records[0].schedule_kind.as_deref(), Some("Daily"));
    }

    #[tokio::test]
    async fn test_window_tally() {
        let server = MockServer::new()
            .with_tasks(
                "s1",
                vec![
                    task("t1", Some("sch-day")),
                    task("t2", Some("sch-day")),
                    task("t3", None),
                ],
            )
            .with_schedules("s1", vec![schedule("sch-day", Some(10))]);

        let records = scan_with(server).await;
        let tally = count_by_window(&records);

        assert_eq!(tally.get("peak"), Some(&2));
        assert_eq!(tally.get("unknown"), Some(&1));
    }
}
