//! Per-resource governance scanners.
//!
//! Each scanner implements [`SiteScanner`], the seam the sweep coordinator
//! drives: given the authenticated session switched into one site, return
//! that site's flagged records. Scanners are pure over the session's
//! listing calls; thresholds and the reference time are captured at
//! construction so runs are deterministic and testable.
//!
//! ## Available Scanners
//!
//! - [`StaleUserScanner`] - users without a recent sign-in
//! - [`StaleContentScanner`] - workbooks and datasources without recent
//!   updates
//! - [`ExtractTaskScanner`] - extract refreshes and their peak-window
//!   classification
//! - [`scan_stale_sites`] - the server-level site staleness scan (runs on
//!   the site list itself, not per site)

mod content;
mod extracts;
mod sites;
mod users;

pub use content::{count_by_kind, ContentKind, StaleContentRecord, StaleContentScanner};
pub use extracts::{
    count_by_schedule_kind, count_by_window, ExtractTaskRecord, ExtractTaskScanner, PeakWindow,
    PEAK_END_HOUR, PEAK_START_HOUR,
};
pub use sites::{scan_stale_sites, SiteStatusSummary, StaleSiteRecord};
pub use users::{StaleUserRecord, StaleUserScanner};

use crate::client::Session;
use crate::core::{Site, SweepResult};

use async_trait::async_trait;
use std::collections::BTreeMap;

/// A per-site scan invoked by the sweep coordinator.
///
/// Implementations receive the session already switched into `site`'s
/// context and return the records flagged for that one site, stamped with
/// the site's identity. They must not sign in, sign out, or switch sites
/// themselves.
#[async_trait]
pub trait SiteScanner: Send + Sync {
    /// The record type this scanner emits.
    type Record: Send;

    /// Human-readable resource name for audit events (e.g. "users").
    fn resource_name(&self) -> &str;

    /// Scans one site and returns its flagged records, in emission order.
    async fn scan(&self, session: &Session, site: &Site) -> SweepResult<Vec<Self::Record>>;
}

/// A record stamped with its originating site.
pub trait SiteStamped {
    /// Name of the site the record came from.
    fn site_name(&self) -> &str;
}

/// Counts records per site name, in name order.
///
/// Used to populate the per-site breakdown metadata of report documents;
/// the coordinator itself never groups.
pub fn count_by_site<'a, T, I>(items: I) -> BTreeMap<String, usize>
where
    T: SiteStamped + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.site_name().to_string()).or_insert(0) += 1;
    }
    counts
}
