//! Inactive user detection.

use crate::client::Session;
use crate::core::{Site, SweepResult};
use crate::scanners::{SiteScanner, SiteStamped};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A user flagged as inactive on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleUserRecord {
    /// Sign-in name.
    pub username: String,

    /// Full display name, if set.
    pub full_name: Option<String>,

    /// Email address, if set.
    pub email: Option<String>,

    /// Authentication domain ("local" when server-managed).
    pub domain: String,

    /// Site role at the time of the scan.
    pub site_role: String,

    /// Last successful sign-in.
    pub last_sign_in: DateTime<Utc>,

    /// Whole days since the last sign-in.
    pub days_inactive: i64,

    /// Name of the originating site.
    pub site_name: String,

    /// Identifier of the originating site.
    pub site_id: String,

    /// Content URL of the originating site ("default" for the default site).
    pub site_content_url: String,
}

impl SiteStamped for StaleUserRecord {
    fn site_name(&self) -> &str {
        &self.site_name
    }
}

/// Flags users whose last sign-in predates the staleness threshold.
///
/// Users who have never signed in are not flagged: without a sign-in
/// timestamp there is no evidence of inactivity, only of provisioning.
#[derive(Debug, Clone)]
pub struct StaleUserScanner {
    threshold_days: u32,
    reference_time: DateTime<Utc>,
}

impl StaleUserScanner {
    /// Creates a scanner flagging users inactive for `threshold_days`.
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
}

#[async_trait]
impl SiteScanner for StaleUserScanner {
    type Record = StaleUserRecord;

    fn resource_name(&self) -> &str {
        "users"
    }

    async fn scan(&self, session: &Session, site: &Site) -> SweepResult<Vec<StaleUserRecord>> {
        let cutoff = self.cutoff();
        let users = session.list_users().await?;

        let records = users
            .into_iter()
            .filter_map(|user| {
                let last_sign_in = user.last_sign_in?;
                if last_sign_in >= cutoff {
                    return None;
                }
                Some(StaleUserRecord {
                    username: user.name,
                    full_name: user.full_name,
                    email: user.email,
                    domain: user.domain.unwrap_or_else(|| "local".to_string()),
                    site_role: user.site_role,
                    last_sign_in,
                    days_inactive: (self.reference_time - last_sign_in).num_days(),
                    site_name: site.name.clone(),
                    site_id: site.id.clone(),
                    site_content_url: site.content_url_or_default().to_string(),
                })
            })
            .collect();

        Ok(records)
    }
}
