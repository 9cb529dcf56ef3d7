//! REST implementation of the server protocol.
//!
//! This module provides a [`ServerClient`] that speaks the BI server's
//! JSON REST API.
//!
//! # Requirements
//!
//! - A personal access token with server-administrator scope
//! - Network access to the server's API endpoint
//!
//! # API Usage
//!
//! Sign-in exchanges the token for a short-lived session credential which
//! is then presented on every call via the `X-Auth-Token` header. Site
//! switching re-issues the credential bound to another site's context.

use crate::client::traits::{AuthToken, ServerClient};
use crate::core::{
    AdminMode, Credentials, Datasource, ExtractTask, GovernanceError, Schedule, Site, SweepResult,
    User, Workbook,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the server, without a trailing slash.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// API version path segment.
    pub api_version: String,
}

impl RestConfig {
    /// Creates a configuration for the given server URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: Duration::from_secs(60),
            api_version: "3.22".to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the API version path segment.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// REST [`ServerClient`] implementation.
#[derive(Debug)]
pub struct RestClient {
    config: RestConfig,
    client: reqwest::Client,
}

impl RestClient {
    /// Creates a new REST client with the given configuration.
    pub fn new(config: RestConfig) -> SweepResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                GovernanceError::configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.config.base_url, self.config.api_version, path
        )
    }

    fn transport_error(&self, operation: &str, error: reqwest::Error) -> GovernanceError {
        if error.is_timeout() {
            GovernanceError::timeout(operation, self.config.timeout)
        } else {
            GovernanceError::connection(error.to_string())
        }
    }

    /// Maps a non-success response to the error taxonomy and extracts the
    /// body otherwise.
    async fn read_body<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> SweepResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(GovernanceError::server(status.as_u16(), message));
        }

        response.json::<T>().await.map_err(|e| {
            GovernanceError::server_message(format!("unparseable {operation} response: {e}"))
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        token: &AuthToken,
        path: &str,
    ) -> SweepResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("X-Auth-Token", &token.value)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        self.read_body(operation, response).await
    }

    fn site_path(token: &AuthToken, resource: &str) -> String {
        format!("sites/{}/{resource}", token.site_id)
    }
}

#[async_trait]
impl ServerClient for RestClient {
    async fn sign_in(&self, credentials: &Credentials) -> SweepResult<AuthToken> {
        let body = json!({
            "credentials": {
                "personalAccessTokenName": credentials.token_name,
                "personalAccessTokenSecret": credentials.token_secret.expose_secret(),
                "site": { "contentUrl": credentials.site_content_url },
            }
        });

        let response = self
            .client
            .post(self.url("auth/signin"))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("sign_in", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(GovernanceError::authentication(message));
        }

        let body: SignInEnvelope = self.read_body("sign_in", response).await?;
        Ok(AuthToken::new(body.credentials.token).for_site(body.credentials.site.id))
    }

    async fn sign_out(&self, token: &AuthToken) -> SweepResult<()> {
        let response = self
            .client
            .post(self.url("auth/signout"))
            .header("X-Auth-Token", &token.value)
            .send()
            .await
            .map_err(|e| self.transport_error("sign_out", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GovernanceError::server(status.as_u16(), "sign-out failed"));
        }
        Ok(())
    }

    async fn list_sites(&self, token: &AuthToken) -> SweepResult<Vec<Site>> {
        let body: SitesEnvelope = self.get("list_sites", token, "sites").await?;
        Ok(body.sites.site.into_iter().map(Site::from).collect())
    }

    async fn switch_site(&self, token: &AuthToken, site: &Site) -> SweepResult<AuthToken> {
        let body = json!({ "site": { "contentUrl": site.content_url } });

        let response = self
            .client
            .post(self.url("auth/switchSite"))
            .header("X-Auth-Token", &token.value)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("switch_site", e))?;

        let body: SignInEnvelope = self.read_body("switch_site", response).await?;
        Ok(AuthToken::new(body.credentials.token).for_site(body.credentials.site.id))
    }

    async fn list_users(&self, token: &AuthToken) -> SweepResult<Vec<User>> {
        let body: UsersEnvelope = self
            .get("list_users", token, &Self::site_path(token, "users"))
            .await?;
        Ok(body.users.user.into_iter().map(User::from).collect())
    }

    async fn list_workbooks(&self, token: &AuthToken) -> SweepResult<Vec<Workbook>> {
        let body: WorkbooksEnvelope = self
            .get("list_workbooks", token, &Self::site_path(token, "workbooks"))
            .await?;
        Ok(body.workbooks.workbook.into_iter().map(Workbook::from).collect())
    }

    async fn list_datasources(&self, token: &AuthToken) -> SweepResult<Vec<Datasource>> {
        let body: DatasourcesEnvelope = self
            .get(
                "list_datasources",
                token,
                &Self::site_path(token, "datasources"),
            )
            .await?;
        Ok(body
            .datasources
            .datasource
            .into_iter()
            .map(Datasource::from)
            .collect())
    }

    async fn list_tasks(&self, token: &AuthToken) -> SweepResult<Vec<ExtractTask>> {
        let body: TasksEnvelope = self
            .get(
                "list_tasks",
                token,
                &Self::site_path(token, "tasks/extractRefreshes"),
            )
            .await?;
        Ok(body.tasks.task.into_iter().map(ExtractTask::from).collect())
    }

    async fn list_schedules(&self, token: &AuthToken) -> SweepResult<Vec<Schedule>> {
        let body: SchedulesEnvelope = self.get("list_schedules", token, "schedules").await?;
        Ok(body
            .schedules
            .schedule
            .into_iter()
            .map(Schedule::from)
            .collect())
    }
}

// Wire shapes. The server wraps every collection in a singular-named
// envelope; conversions below normalize field names and fill defaults.

#[derive(Debug, Deserialize)]
struct SignInEnvelope {
    credentials: WireSessionCredentials,
}

#[derive(Debug, Deserialize)]
struct WireSessionCredentials {
    token: String,
    site: WireSiteRef,
}

#[derive(Debug, Deserialize)]
struct WireSiteRef {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct SitesEnvelope {
    sites: WireSiteList,
}

#[derive(Debug, Deserialize)]
struct WireSiteList {
    #[serde(default)]
    site: Vec<WireSite>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSite {
    id: String,
    name: String,
    #[serde(default)]
    content_url: String,
    #[serde(default = "default_state")]
    state: String,
    #[serde(default)]
    admin_mode: Option<String>,
    #[serde(default)]
    user_quota: Option<u32>,
    #[serde(default)]
    storage_quota: Option<u64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

fn default_state() -> String {
    "Active".to_string()
}

impl From<WireSite> for Site {
    fn from(wire: WireSite) -> Self {
        let admin_mode = match wire.admin_mode.as_deref() {
            Some("ContentOnly") => AdminMode::ContentOnly,
            _ => AdminMode::ContentAndUsers,
        };
        Self {
            id: wire.id,
            name: wire.name,
            content_url: wire.content_url,
            state: wire.state,
            admin_mode,
            user_quota: wire.user_quota,
            storage_quota_mb: wire.storage_quota,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    users: WireUserList,
}

#[derive(Debug, Deserialize)]
struct WireUserList {
    #[serde(default)]
    user: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    id: String,
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default = "default_site_role")]
    site_role: String,
    #[serde(default)]
    last_login: Option<DateTime<Utc>>,
}

fn default_site_role() -> String {
    "Viewer".to_string()
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            full_name: wire.full_name,
            email: wire.email,
            domain: wire.domain,
            site_role: wire.site_role,
            last_sign_in: wire.last_login,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkbooksEnvelope {
    workbooks: WireWorkbookList,
}

#[derive(Debug, Deserialize)]
struct WireWorkbookList {
    #[serde(default)]
    workbook: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
struct DatasourcesEnvelope {
    datasources: WireDatasourceList,
}

#[derive(Debug, Deserialize)]
struct WireDatasourceList {
    #[serde(default)]
    datasource: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    id: String,
    name: String,
    #[serde(default)]
    project: Option<WireNamed>,
    #[serde(default)]
    owner: Option<WireIdRef>,
    #[serde(default)]
    content_url: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    total_view_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireIdRef {
    #[serde(default)]
    id: String,
}

impl From<WireContent> for Workbook {
    fn from(wire: WireContent) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            project: wire.project.and_then(|p| p.name),
            owner_id: wire.owner.map(|o| o.id).unwrap_or_default(),
            content_url: wire.content_url,
            updated_at: wire.updated_at,
            size_bytes: wire.size,
            view_count: wire.total_view_count,
        }
    }
}

impl From<WireContent> for Datasource {
    fn from(wire: WireContent) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            project: wire.project.and_then(|p| p.name),
            owner_id: wire.owner.map(|o| o.id).unwrap_or_default(),
            content_url: wire.content_url,
            updated_at: wire.updated_at,
            size_bytes: wire.size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TasksEnvelope {
    tasks: WireTaskList,
}

#[derive(Debug, Deserialize)]
struct WireTaskList {
    #[serde(default)]
    task: Vec<WireTask>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    id: String,
    #[serde(default)]
    schedule: Option<WireIdRef>,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    target: Option<WireTarget>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTarget {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<WireTask> for ExtractTask {
    fn from(wire: WireTask) -> Self {
        let (target_type, target_name) = wire
            .target
            .map(|t| (t.kind, t.name))
            .unwrap_or((None, None));
        Self {
            id: wire.id,
            schedule_id: wire.schedule.map(|s| s.id),
            priority: wire.priority,
            target_type,
            target_name,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchedulesEnvelope {
    schedules: WireScheduleList,
}

#[derive(Debug, Deserialize)]
struct WireScheduleList {
    #[serde(default)]
    schedule: Vec<WireSchedule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSchedule {
    id: String,
    name: String,
    #[serde(default = "default_state")]
    state: String,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    start_time: Option<NaiveTime>,
}

impl From<WireSchedule> for Schedule {
    fn from(wire: WireSchedule) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            state: wire.state,
            kind: wire.frequency.unwrap_or_else(|| "Unknown".to_string()),
            start_time: wire.start_time,
        }
    }
}
