//! Server-level stale site detection.
//!
//! Unlike the per-site scanners this operates on the site list itself:
//! no site switching is involved, so it is a plain function over the
//! enumeration the coordinator (or caller) already fetched.

use crate::core::Site;
use crate::scanners::SiteStamped;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A site flagged as stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleSiteRecord {
    /// Name of the site.
    pub site_name: String,

    /// Identifier of the site.
    pub site_id: String,

    /// Content URL ("default" for the default site).
    pub content_url: String,

    /// Lifecycle state reported by the server.
    pub state: String,

    /// Administrative mode.
    pub admin_mode: String,

    /// User quota, when the site is quota-limited.
    pub user_quota: Option<u32>,

    /// Storage quota in megabytes, when the site is quota-limited.
    pub storage_quota_mb: Option<u64>,

    /// When the site was created.
    pub created_at: Option<DateTime<Utc>>,

    /// When the site was last updated.
    pub updated_at: Option<DateTime<Utc>>,

    /// Most recent activity timestamp used for the staleness decision.
    pub last_activity: DateTime<Utc>,

    /// Whole days since the last activity.
    pub days_stale: i64,
}

impl SiteStamped for StaleSiteRecord {
    fn site_name(&self) -> &str {
        &self.site_name
    }
}

/// Aggregate counts accompanying a stale-site scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatusSummary {
    /// Total number of sites examined.
    pub total_sites: usize,

    /// Number of sites flagged stale.
    pub stale_sites: usize,

    /// Number of sites with recent activity (or no timestamps at all).
    pub active_sites: usize,

    /// Share of stale sites, as a percentage rounded to one decimal.
    pub stale_percentage: f64,
}

/// Flags sites whose last activity predates the threshold.
///
/// Activity is `updated_at` falling back to `created_at`; sites reporting
/// neither are counted active, since there is no evidence either way.
/// Returns the flagged records in enumeration order plus the status
/// summary.
pub fn scan_stale_sites(
    sites: &[Site],
    threshold_days: u32,
    reference_time: DateTime<Utc>,
) -> (Vec<StaleSiteRecord>, SiteStatusSummary) {
    let cutoff = reference_time - Duration::days(i64::from(threshold_days));
    let mut records = Vec::new();

    for site in sites {
        let Some(last_activity) = site.last_activity() else {
            continue;
        };
        if last_activity >= cutoff {
            continue;
        }
        records.push(StaleSiteRecord {
            site_name: site.name.clone(),
            site_id: site.id.clone(),
            content_url: site.content_url_or_default().to_string(),
            state: site.state.clone(),
            admin_mode: site.admin_mode.to_string(),
            user_quota: site.user_quota,
            storage_quota_mb: site.storage_quota_mb,
            created_at: site.created_at,
            updated_at: site.updated_at,
            last_activity,
            days_stale: (reference_time - last_activity).num_days(),
        });
    }

    let total_sites = sites.len();
    let stale_sites = records.len();
    let stale_percentage = if total_sites == 0 {
        0.0
    } else {
        (stale_sites as f64 / total_sites as f64 * 1000.0).round() / 10.0
    };

    let summary = SiteStatusSummary {
        total_sites,
        stale_sites,
        active_sites: total_sites - stale_sites,
        stale_percentage,
    };

    (records, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockServer;
    use chrono::TimeZone;

    fn site_updated_at(id: &str, name: &str, updated: Option<DateTime<Utc>>) -> Site {
        let mut site = MockServer::site(id, name);
        site.updated_at = updated;
        site
    }

    #[test]
    fn test_flags_stale_sites() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let sites = vec![
            site_updated_at("s1", "Old", Some(now - Duration::days(900))),
            site_updated_at("s2", "Fresh", Some(now - Duration::days(30))),
        ];

        let (records, summary) = scan_stale_sites(&sites, 730, now);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].site_name, "Old");
        assert_eq!(records[0].days_stale, 900);
        assert_eq!(summary.total_sites, 2);
        assert_eq!(summary.stale_sites, 1);
        assert_eq!(summary.active_sites, 1);
        assert_eq!(summary.stale_percentage, 50.0);
    }

    #[test]
    fn test_falls_back_to_created_at() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut site = MockServer::site("s1", "OnlyCreated");
        site.created_at = Some(now - Duration::days(1000));

        let (records, _) = scan_stale_sites(&[site], 730, now);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].days_stale, 1000);
    }

    #[test]
    fn test_no_timestamps_counts_active() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let sites = vec![MockServer::site("s1", "NoDates")];

        let (records, summary) = scan_stale_sites(&sites, 730, now);

        assert!(records.is_empty());
        assert_eq!(summary.active_sites, 1);
    }

    #[test]
    fn test_empty_enumeration() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let (records, summary) = scan_stale_sites(&[], 730, now);

        assert!(records.is_empty());
        assert_eq!(summary.stale_percentage, 0.0);
    }
}
