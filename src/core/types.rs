//! Core types used throughout the sitesweep library.
//!
//! This module defines the fundamental data structures for representing
//! sites, the resource records returned by the server protocol, sign-in
//! credentials, and the per-run context.

use chrono::{DateTime, NaiveTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative mode of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminMode {
    /// Site admins may manage both users and content.
    ContentAndUsers,
    /// Site admins may manage content only.
    ContentOnly,
}

impl fmt::Display for AdminMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentAndUsers => write!(f, "content_and_users"),
            Self::ContentOnly => write!(f, "content_only"),
        }
    }
}

/// A tenant/workspace partition on the server.
///
/// Sites are owned by the remote server; the sweep coordinator only reads
/// them. The default site has an empty `content_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Server-assigned site identifier.
    pub id: String,

    /// Display name of the site.
    pub name: String,

    /// URL path segment identifying the site (empty for the default site).
    pub content_url: String,

    /// Lifecycle state reported by the server (e.g. "Active", "Suspended").
    pub state: String,

    /// Administrative mode of the site.
    pub admin_mode: AdminMode,

    /// Maximum number of users, if the site is quota-limited.
    pub user_quota: Option<u32>,

    /// Storage quota in megabytes, if the site is quota-limited.
    pub storage_quota_mb: Option<u64>,

    /// When the site was created.
    pub created_at: Option<DateTime<Utc>>,

    /// When the site was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Site {
    /// Returns the content URL, substituting `"default"` for the default site.
    pub fn content_url_or_default(&self) -> &str {
        if self.content_url.is_empty() {
            "default"
        } else {
            &self.content_url
        }
    }

    /// Returns the most recent activity timestamp available.
    ///
    /// Uses `updated_at` when present, falling back to `created_at`.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Personal access token credentials for signing in.
///
/// The token secret is held as a [`SecretString`] so it is redacted from
/// debug output and never serialized accidentally.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Name of the personal access token.
    pub token_name: String,

    /// Secret value of the personal access token.
    pub token_secret: SecretString,

    /// Site to sign in to (empty for server-level, multi-site operations).
    pub site_content_url: String,
}

impl Credentials {
    /// Creates credentials for server-level (multi-site) operations.
    pub fn new(token_name: impl Into<String>, token_secret: impl Into<String>) -> Self {
        Self {
            token_name: token_name.into(),
            token_secret: SecretString::new(token_secret.into().into()),
            site_content_url: String::new(),
        }
    }

    /// Scopes the sign-in to a specific site.
    pub fn with_site(mut self, content_url: impl Into<String>) -> Self {
        self.site_content_url = content_url.into();
        self
    }
}

/// A user account on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned user identifier.
    pub id: String,

    /// Sign-in name.
    pub name: String,

    /// Full display name, if set.
    pub full_name: Option<String>,

    /// Email address, if set.
    pub email: Option<String>,

    /// Authentication domain ("local" for server-managed accounts).
    pub domain: Option<String>,

    /// Site role (e.g. "Viewer", "Creator", "SiteAdministrator").
    pub site_role: String,

    /// Last successful sign-in, if the user has ever signed in.
    pub last_sign_in: Option<DateTime<Utc>>,
}

/// A workbook published to one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// Server-assigned workbook identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Name of the containing project, if known.
    pub project: Option<String>,

    /// Identifier of the owning user.
    pub owner_id: String,

    /// URL path segment for the workbook.
    pub content_url: Option<String>,

    /// When the workbook was last updated.
    pub updated_at: Option<DateTime<Utc>>,

    /// Size in bytes, if reported.
    pub size_bytes: Option<u64>,

    /// Total view count, if reported.
    pub view_count: Option<u64>,
}

/// A published datasource on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    /// Server-assigned datasource identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Name of the containing project, if known.
    pub project: Option<String>,

    /// Identifier of the owning user.
    pub owner_id: String,

    /// URL path segment for the datasource.
    pub content_url: Option<String>,

    /// When the datasource was last updated.
    pub updated_at: Option<DateTime<Utc>>,

    /// Size in bytes, if reported.
    pub size_bytes: Option<u64>,
}

/// An extract-refresh task scheduled on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTask {
    /// Server-assigned task identifier.
    pub id: String,

    /// Identifier of the schedule driving this task, if any.
    pub schedule_id: Option<String>,

    /// Refresh priority (lower runs first).
    pub priority: u32,

    /// Type of the refresh target ("workbook" or "datasource"), if known.
    pub target_type: Option<String>,

    /// Name of the refresh target, if known.
    pub target_name: Option<String>,

    /// When the task was created.
    pub created_at: Option<DateTime<Utc>>,
}

/// A refresh schedule defined on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Server-assigned schedule identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Lifecycle state ("Active", "Suspended").
    pub state: String,

    /// Recurrence kind ("Hourly", "Daily", "Weekly", "Monthly").
    pub kind: String,

    /// Time of day the schedule starts, when the server reports one.
    pub start_time: Option<NaiveTime>,
}

/// Per-run context attached to all observability events.
///
/// The correlation identifier is generated once per process run and lets
/// log aggregation tie every event of a sweep together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Opaque correlation identifier for this run.
    pub correlation_id: uuid::Uuid,

    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// Creates a fresh run context with a new correlation identifier.
    pub fn new() -> Self {
        Self {
            correlation_id: uuid::Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_site(updated: Option<DateTime<Utc>>, created: Option<DateTime<Utc>>) -> Site {
        Site {
            id: "s1".into(),
            name: "Finance".into(),
            content_url: String::new(),
            state: "Active".into(),
            admin_mode: AdminMode::ContentAndUsers,
            user_quota: None,
            storage_quota_mb: None,
            created_at: created,
            updated_at: updated,
        }
    }

    #[test]
    fn test_content_url_or_default() {
        let site = make_site(None, None);
        assert_eq!(site.content_url_or_default(), "default");

        let mut site = site;
        site.content_url = "finance".into();
        assert_eq!(site.content_url_or_default(), "finance");
    }

    #[test]
    fn test_last_activity_prefers_updated_at() {
        let created = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(
            make_site(Some(updated), Some(created)).last_activity(),
            Some(updated)
        );
        assert_eq!(make_site(None, Some(created)).last_activity(), Some(created));
        assert_eq!(make_site(None, None).last_activity(), None);
    }

    #[test]
    fn test_credentials_redact_secret() {
        let creds = Credentials::new("ci-token", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_run_context_correlation_ids_unique() {
        let a = RunContext::new();
        let b = RunContext::new();
        assert_ne!(a.correlation_id, b.correlation_id);
    }
}
