//! Mock server client for testing.
//!
//! This module provides a configurable in-memory [`ServerClient`] used to
//! exercise retry behavior, partial-failure handling, and the scanners
//! without a real server.

use crate::client::traits::{AuthToken, ServerClient};
use crate::core::{
    AdminMode, Credentials, Datasource, ExtractTask, GovernanceError, Schedule, Site, SweepResult,
    User, Workbook,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;

/// Failure mode injected into a [`MockServer`] for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// The server responds with the given HTTP-like status code.
    ServerStatus(u16),
    /// The connection fails at the transport level.
    Connection,
    /// A fatal, non-server failure (models a programming/config error).
    Fatal,
}

impl MockFailure {
    fn to_error(self) -> GovernanceError {
        match self {
            Self::ServerStatus(status) => GovernanceError::server(status, "injected failure"),
            Self::Connection => GovernanceError::connection("injected connection failure"),
            Self::Fatal => GovernanceError::session("injected fatal failure"),
        }
    }
}

/// An in-memory server with programmable fixtures and failures.
///
/// # Examples
///
/// ```rust
/// use sitesweep::client::{MockFailure, MockServer};
///
/// let server = MockServer::new()
///     .with_site(MockServer::site("s1", "Finance"))
///     .with_site(MockServer::site("s2", "Marketing"))
///     .fail_site("s2", MockFailure::ServerStatus(404));
/// ```
#[derive(Debug, Default)]
pub struct MockServer {
    sites: RwLock<Vec<Site>>,
    users: RwLock<HashMap<String, Vec<User>>>,
    workbooks: RwLock<HashMap<String, Vec<Workbook>>>,
    datasources: RwLock<HashMap<String, Vec<Datasource>>>,
    tasks: RwLock<HashMap<String, Vec<ExtractTask>>>,
    schedules: RwLock<HashMap<String, Vec<Schedule>>>,
    failing_sites: RwLock<HashMap<String, MockFailure>>,
    sign_in_failures: AtomicU32,
    list_sites_failures: AtomicU32,
    reject_credentials: AtomicBool,
    sign_in_calls: AtomicU32,
    sign_out_calls: AtomicU32,
    list_sites_calls: AtomicU32,
    switch_calls: AtomicU32,
    token_counter: AtomicU32,
}

impl MockServer {
    /// Creates an empty mock server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a minimal active site fixture.
    pub fn site(id: impl Into<String>, name: impl Into<String>) -> Site {
        let name = name.into();
        Site {
            id: id.into(),
            content_url: name.to_lowercase(),
            name,
            state: "Active".into(),
            admin_mode: AdminMode::ContentAndUsers,
            user_quota: None,
            storage_quota_mb: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Adds a site to the enumeration, preserving insertion order.
    pub fn with_site(self, site: Site) -> Self {
        self.sites.write().unwrap().push(site);
        self
    }

    /// Sets the user fixtures for a site.
    pub fn with_users(self, site_id: impl Into<String>, users: Vec<User>) -> Self {
        self.users.write().unwrap().insert(site_id.into(), users);
        self
    }

    /// Sets the workbook fixtures for a site.
    pub fn with_workbooks(self, site_id: impl Into<String>, workbooks: Vec<Workbook>) -> Self {
        self.workbooks
            .write()
            .unwrap()
            .insert(site_id.into(), workbooks);
        self
    }

    /// Sets the datasource fixtures for a site.
    pub fn with_datasources(self, site_id: impl Into<String>, datasources: Vec<Datasource>) -> Self {
        self.datasources
            .write()
            .unwrap()
            .insert(site_id.into(), datasources);
        self
    }

    /// Sets the extract-task fixtures for a site.
    pub fn with_tasks(self, site_id: impl Into<String>, tasks: Vec<ExtractTask>) -> Self {
        self.tasks.write().unwrap().insert(site_id.into(), tasks);
        self
    }

    /// Sets the schedule fixtures for a site.
    pub fn with_schedules(self, site_id: impl Into<String>, schedules: Vec<Schedule>) -> Self {
        self.schedules
            .write()
            .unwrap()
            .insert(site_id.into(), schedules);
        self
    }

    /// Makes every call against the given site fail with the given mode.
    ///
    /// The failure fires on `switch_site` and on every listing call bound
    /// to that site.
    pub fn fail_site(self, site_id: impl Into<String>, failure: MockFailure) -> Self {
        self.failing_sites
            .write()
            .unwrap()
            .insert(site_id.into(), failure);
        self
    }

    /// Fails the first `n` sign-in attempts with a 503.
    pub fn fail_sign_in_attempts(self, n: u32) -> Self {
        self.sign_in_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Fails the first `n` site-list calls with a 503.
    pub fn fail_list_sites_attempts(self, n: u32) -> Self {
        self.list_sites_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Rejects every sign-in with an authentication error.
    pub fn reject_credentials(self) -> Self {
        self.reject_credentials.store(true, Ordering::SeqCst);
        self
    }

    /// Number of sign-in attempts received.
    pub fn sign_in_calls(&self) -> u32 {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of sign-out calls received.
    pub fn sign_out_calls(&self) -> u32 {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Number of site-list calls received.
    pub fn list_sites_calls(&self) -> u32 {
        self.list_sites_calls.load(Ordering::SeqCst)
    }

    /// Number of site-switch calls received.
    pub fn switch_calls(&self) -> u32 {
        self.switch_calls.load(Ordering::SeqCst)
    }

    fn next_token(&self) -> String {
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst);
        format!("mock-token-{n}")
    }

    fn check_site(&self, site_id: &str) -> SweepResult<()> {
        if let Some(failure) = self.failing_sites.read().unwrap().get(site_id) {
            return Err(failure.to_error());
        }
        Ok(())
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn lookup<T: Clone>(map: &RwLock<HashMap<String, Vec<T>>>, site_id: &str) -> Vec<T> {
        map.read()
            .unwrap()
            .get(site_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ServerClient for MockServer {
    async fn sign_in(&self, credentials: &Credentials) -> SweepResult<AuthToken> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_credentials.load(Ordering::SeqCst) {
            return Err(GovernanceError::authentication("credentials rejected"));
        }
        if Self::take_failure(&self.sign_in_failures) {
            return Err(GovernanceError::server(503, "sign-in unavailable"));
        }

        let site_id = if credentials.site_content_url.is_empty() {
            String::new()
        } else {
            self.sites
                .read()
                .unwrap()
                .iter()
                .find(|s| s.content_url == credentials.site_content_url)
                .map(|s| s.id.clone())
                .ok_or_else(|| GovernanceError::server(404, "site not found"))?
        };

        Ok(AuthToken::new(self.next_token()).for_site(site_id))
    }

    async fn sign_out(&self, _token: &AuthToken) -> SweepResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_sites(&self, _token: &AuthToken) -> SweepResult<Vec<Site>> {
        self.list_sites_calls.fetch_add(1, Ordering::SeqCst);

        if Self::take_failure(&self.list_sites_failures) {
            return Err(GovernanceError::server(503, "site list unavailable"));
        }

        Ok(self.sites.read().unwrap().clone())
    }

    async fn switch_site(&self, _token: &AuthToken, site: &Site) -> SweepResult<AuthToken> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_site(&site.id)?;
        Ok(AuthToken::new(self.next_token()).for_site(site.id.clone()))
    }

    async fn list_users(&self, token: &AuthToken) -> SweepResult<Vec<User>> {
        self.check_site(&token.site_id)?;
        Ok(Self::lookup(&self.users, &token.site_id))
    }

    async fn list_workbooks(&self, token: &AuthToken) -> SweepResult<Vec<Workbook>> {
        self.check_site(&token.site_id)?;
        Ok(Self::lookup(&self.workbooks, &token.site_id))
    }

    async fn list_datasources(&self, token: &AuthToken) -> SweepResult<Vec<Datasource>> {
        self.check_site(&token.site_id)?;
        Ok(Self::lookup(&self.datasources, &token.site_id))
    }

    async fn list_tasks(&self, token: &AuthToken) -> SweepResult<Vec<ExtractTask>> {
        self.check_site(&token.site_id)?;
        Ok(Self::lookup(&self.tasks, &token.site_id))
    }

    async fn list_schedules(&self, token: &AuthToken) -> SweepResult<Vec<Schedule>> {
        self.check_site(&token.site_id)?;
        Ok(Self::lookup(&self.schedules, &token.site_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("ci-token", "s3cret")
    }

    #[tokio::test]
    async fn test_sign_in_and_enumerate() {
        let server = MockServer::new()
            .with_site(MockServer::site("s1", "Finance"))
            .with_site(MockServer::site("s2", "Marketing"));

        let token = server.sign_in(&credentials()).await.unwrap();
        let sites = server.list_sites(&token).await.unwrap();

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Finance");
        assert_eq!(server.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_failures_drain() {
        let server = MockServer::new().fail_sign_in_attempts(1);

        assert!(server.sign_in(&credentials()).await.is_err());
        assert!(server.sign_in(&credentials()).await.is_ok());
    }

    #[tokio::test]
    async fn test_site_scoped_listing() {
        let site = MockServer::site("s1", "Finance");
        let server = MockServer::new().with_site(site.clone()).with_users(
            "s1",
            vec![User {
                id: "u1".into(),
                name: "alice".into(),
                full_name: None,
                email: None,
                domain: None,
                site_role: "Viewer".into(),
                last_sign_in: None,
            }],
        );

        let token = server.sign_in(&credentials()).await.unwrap();
        // Server-level token sees no users.
        assert!(server.list_users(&token).await.unwrap().is_empty());

        let token = server.switch_site(&token, &site).await.unwrap();
        assert_eq!(server.list_users(&token).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_site_failure() {
        let site = MockServer::site("s1", "Finance");
        let server = MockServer::new()
            .with_site(site.clone())
            .fail_site("s1", MockFailure::ServerStatus(404));

        let token = server.sign_in(&credentials()).await.unwrap();
        let err = server.switch_site(&token, &site).await.unwrap_err();

        assert!(err.is_server_error());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_sign_in_scoped_to_site() {
        let server = MockServer::new().with_site(MockServer::site("s1", "Finance"));

        let creds = credentials().with_site("finance");
        let token = server.sign_in(&creds).await.unwrap();
        assert_eq!(token.site_id, "s1");

        let creds = credentials().with_site("nope");
        assert!(server.sign_in(&creds).await.is_err());
    }
}
