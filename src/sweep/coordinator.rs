//! The sweep coordinator implementation.

use crate::audit::{AuditSink, TracingSink};
use crate::client::{ArcServerClient, AuthToken, Session};
use crate::core::{GovernanceConfig, GovernanceError, Site, SweepResult};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::scanners::SiteScanner;

use std::sync::Arc;
use std::time::Instant;

/// The aggregate result of one multi-site sweep.
///
/// `items` is the concatenation of per-site record sequences in site
/// enumeration order; no cross-site sort or de-duplication is applied,
/// and the same resource name appearing in several sites is expected.
#[derive(Debug, Clone)]
pub struct SweepOutcome<T> {
    /// Flagged records from every reachable site, in order.
    pub items: Vec<T>,

    /// Number of sites scanned successfully.
    pub sites_scanned: usize,

    /// Names of sites skipped after a site-scoped server error.
    pub skipped_sites: Vec<String>,
}

impl<T> SweepOutcome<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            sites_scanned: 0,
            skipped_sites: Vec::new(),
        }
    }

    /// Returns `true` when no site had to be skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped_sites.is_empty()
    }
}

/// Builder for creating a [`SweepCoordinator`].
pub struct SweepCoordinatorBuilder {
    client: Option<ArcServerClient>,
    config: Option<GovernanceConfig>,
    sink: Option<Arc<dyn AuditSink>>,
    api_policy: RetryPolicy,
    auth_policy: RetryPolicy,
}

impl SweepCoordinatorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            client: None,
            config: None,
            sink: None,
            api_policy: RetryPolicy::api(),
            auth_policy: RetryPolicy::auth(),
        }
    }

    /// Sets the server client.
    pub fn client(mut self, client: ArcServerClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: GovernanceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the audit sink. Defaults to a fresh [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the retry policy for API calls. Defaults to [`RetryPolicy::api`].
    pub fn api_policy(mut self, policy: RetryPolicy) -> Self {
        self.api_policy = policy;
        self
    }

    /// Sets the retry policy for sign-in. Defaults to [`RetryPolicy::auth`].
    pub fn auth_policy(mut self, policy: RetryPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    /// Builds the coordinator, validating the configuration first.
    pub fn build(self) -> SweepResult<SweepCoordinator> {
        let client = self
            .client
            .ok_or_else(|| GovernanceError::configuration("a server client is required"))?;
        let config = self
            .config
            .ok_or_else(|| GovernanceError::configuration("a configuration is required"))?;
        config.validate()?;

        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingSink::default()));

        Ok(SweepCoordinator {
            executor: RetryExecutor::new(self.api_policy, Arc::clone(&sink)),
            auth_executor: RetryExecutor::new(self.auth_policy, Arc::clone(&sink)),
            client,
            config,
            sink,
            session: None,
        })
    }
}

impl Default for SweepCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates governance scans across every site of one server.
///
/// Lifecycle per run: [`connect`](Self::connect) establishes the session,
/// [`scan_all_sites`](Self::scan_all_sites) runs a scanner over the
/// enumeration, and [`close`](Self::close) signs out. [`run`](Self::run)
/// composes the three so the session is released on both the success and
/// the abort path.
///
/// Execution is strictly sequential: sites are visited one at a time in
/// enumeration order, and the only suspension points are the retry
/// executor's backoff sleeps.
pub struct SweepCoordinator {
    client: ArcServerClient,
    config: GovernanceConfig,
    sink: Arc<dyn AuditSink>,
    executor: RetryExecutor,
    auth_executor: RetryExecutor,
    session: Option<Session>,
}

impl SweepCoordinator {
    /// Creates a new builder.
    pub fn builder() -> SweepCoordinatorBuilder {
        SweepCoordinatorBuilder::new()
    }

    /// Returns the configuration in effect.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Returns whether a session is currently established.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Signs in and establishes the run's session.
    ///
    /// Sign-in runs under the auth retry policy: transient network
    /// failures during authentication are retried, rejected credentials
    /// are not. Calling `connect` on an already-connected coordinator is
    /// a no-op.
    pub async fn connect(&mut self) -> SweepResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let credentials = self.config.credentials();
        let token: AuthToken = self
            .auth_executor
            .execute("sign_in", || self.client.sign_in(&credentials))
            .await?;

        tracing::info!(
            server_url = %self.config.server_url,
            "connected to server"
        );

        self.session = Some(Session::new(
            Arc::clone(&self.client),
            token,
            self.executor.clone(),
        ));
        Ok(())
    }

    /// Lists every site on the server through the retry executor.
    ///
    /// # Errors
    ///
    /// Returns a session usage error when called before
    /// [`connect`](Self::connect).
    pub async fn list_sites(&self) -> SweepResult<Vec<Site>> {
        let session = self.session()?;
        session.list_sites().await
    }

    /// Runs `scanner` against every site and concatenates the results.
    ///
    /// The site list is fetched exactly once; if that fetch ultimately
    /// fails the whole run aborts, since there is no meaningful partial
    /// sweep without an enumeration. Per site, the session context is
    /// switched and the scanner invoked; a server-classified error skips
    /// the site (reported through the sink and the outcome's
    /// `skipped_sites`), while any other error aborts the run.
    ///
    /// # Errors
    ///
    /// Returns a session usage error when called before
    /// [`connect`](Self::connect).
    pub async fn scan_all_sites<S: SiteScanner>(
        &mut self,
        scanner: &S,
    ) -> SweepResult<SweepOutcome<S::Record>> {
        let sink = Arc::clone(&self.sink);
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| GovernanceError::session("scan_all_sites called before connect"))?;

        let sites = session.list_sites().await?;
        tracing::info!(site_count = sites.len(), "site enumeration fetched");

        let mut outcome = SweepOutcome::new();

        for site in &sites {
            sink.site_scan_started(site, scanner.resource_name());
            let started = Instant::now();

            let scanned = async {
                session.switch_site(site).await?;
                scanner.scan(&*session, site).await
            }
            .await;

            match scanned {
                Ok(records) => {
                    sink.site_scan_completed(
                        site,
                        scanner.resource_name(),
                        records.len(),
                        started.elapsed(),
                    );
                    outcome.items.extend(records);
                    outcome.sites_scanned += 1;
                }
                Err(error) if error.is_server_error() => {
                    sink.site_scan_skipped(site, scanner.resource_name(), &error);
                    outcome.skipped_sites.push(site.name.clone());
                }
                Err(error) => return Err(error),
            }
        }

        sink.run_completed(
            scanner.resource_name(),
            outcome.items.len(),
            outcome.sites_scanned,
            outcome.skipped_sites.len(),
        );

        Ok(outcome)
    }

    /// Signs out and releases the session.
    ///
    /// Safe to call when no session is established.
    pub async fn close(&mut self) -> SweepResult<()> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Connects, runs one sweep, and signs out.
    ///
    /// The session is released on both the success and the abort path; a
    /// sign-out failure during teardown is logged, never propagated over
    /// the sweep's own result.
    pub async fn run<S: SiteScanner>(
        mut self,
        scanner: &S,
    ) -> SweepResult<SweepOutcome<S::Record>> {
        self.connect().await?;
        let result = self.scan_all_sites(scanner).await;

        if let Err(error) = self.close().await {
            tracing::warn!(%error, "sign-out failed during teardown");
        }

        result
    }

    fn session(&self) -> SweepResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| GovernanceError::session("no session established; call connect first"))
    }
}

impl std::fmt::Debug for SweepCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepCoordinator")
            .field("server_url", &self.config.server_url)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopSink;
    use crate::client::{MockFailure, MockServer, Session};
    use crate::core::{Site, User};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    /// Collects every username of a site, stamped with the site name.
    struct UsernameScanner;

    #[async_trait]
    impl SiteScanner for UsernameScanner {
        type Record = (String, String);

        fn resource_name(&self) -> &str {
            "users"
        }

        async fn scan(&self, session: &Session, site: &Site) -> SweepResult<Vec<(String, String)>> {
            let users = session.list_users().await?;
            Ok(users
                .into_iter()
                .map(|u| (site.name.clone(), u.name))
                .collect())
        }
    }

    fn user(name: &str) -> User {
        User {
            id: format!("u-{name}"),
            name: name.to_string(),
            full_name: None,
            email: None,
            domain: None,
            site_role: "Viewer".into(),
            last_sign_in: Some(Utc::now()),
        }
    }

    fn config() -> GovernanceConfig {
        GovernanceConfig::default()
            .with_server_url("https://bi.example.com")
            .with_token("ci-token", "s3cret")
    }

    fn coordinator(server: Arc<MockServer>) -> SweepCoordinator {
        SweepCoordinator::builder()
            .client(server)
            .config(config())
            .sink(Arc::new(NoopSink))
            .api_policy(RetryPolicy::api().with_jitter(false))
            .auth_policy(RetryPolicy::auth().with_jitter(false))
            .build()
            .unwrap()
    }

    fn three_sites() -> MockServer {
        MockServer::new()
            .with_site(MockServer::site("a", "Alpha"))
            .with_site(MockServer::site("b", "Beta"))
            .with_site(MockServer::site("c", "Gamma"))
            .with_users("a", vec![user("ann")])
            .with_users("b", vec![user("ben")])
            .with_users("c", vec![user("cat"), user("cal")])
    }

    #[test]
    fn test_builder_requires_client_and_config() {
        assert!(SweepCoordinator::builder().build().is_err());

        let result = SweepCoordinator::builder()
            .client(Arc::new(MockServer::new()))
            .config(GovernanceConfig::default())
            .build();
        // Placeholder config fails validation at build time.
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scan_before_connect_is_usage_error() {
        let mut coordinator = coordinator(Arc::new(three_sites()));

        let err = coordinator.scan_all_sites(&UsernameScanner).await.unwrap_err();

        assert!(matches!(err, GovernanceError::Session { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_scans_every_site_in_order() {
        let server = Arc::new(three_sites());
        let outcome = coordinator(server.clone()).run(&UsernameScanner).await.unwrap();

        let names: Vec<&str> = outcome.items.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["ann", "ben", "cat", "cal"]);
        assert_eq!(outcome.sites_scanned, 3);
        assert!(outcome.is_complete());
        // Session released exactly once.
        assert_eq!(server.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn test_broken_site_is_skipped_not_fatal() {
        let server = Arc::new(three_sites().fail_site("b", MockFailure::ServerStatus(404)));
        let outcome = coordinator(server.clone()).run(&UsernameScanner).await.unwrap();

        let names: Vec<&str> = outcome.items.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["ann", "cat", "cal"]);
        assert_eq!(outcome.sites_scanned, 2);
        assert_eq!(outcome.skipped_sites, vec!["Beta".to_string()]);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_fatal_site_error_aborts_run() {
        let server = Arc::new(three_sites().fail_site("a", MockFailure::Fatal));
        let err = coordinator(server.clone())
            .run(&UsernameScanner)
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Session { .. }));
        // The session is still released on the abort path.
        assert_eq!(server.sign_out_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_site_list_fetch_is_retried_then_aborts() {
        // More failures than the api policy's budget: the fetch fails for
        // good and the run aborts.
        let server = Arc::new(three_sites().fail_list_sites_attempts(10));
        let err = coordinator(server.clone())
            .run(&UsernameScanner)
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        // Initial attempt plus the api policy's three retries.
        assert_eq!(server.list_sites_calls(), 4);
        assert_eq!(server.sign_out_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_site_list_failure_recovers() {
        let server = Arc::new(three_sites().fail_list_sites_attempts(2));
        let outcome = coordinator(server.clone()).run(&UsernameScanner).await.unwrap();

        assert_eq!(outcome.sites_scanned, 3);
        assert_eq!(server.list_sites_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retries_transient_sign_in() {
        let server = Arc::new(three_sites().fail_sign_in_attempts(2));
        let mut coordinator = coordinator(server.clone());

        coordinator.connect().await.unwrap();
        assert!(coordinator.is_connected());
        assert_eq!(server.sign_in_calls(), 3);

        coordinator.close().await.unwrap();
        assert!(!coordinator.is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let server = Arc::new(three_sites());
        let mut coordinator = coordinator(server.clone());

        coordinator.connect().await.unwrap();
        coordinator.connect().await.unwrap();

        assert_eq!(server.sign_in_calls(), 1);
        coordinator.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_without_retry() {
        let server = Arc::new(MockServer::new().reject_credentials());
        let err = coordinator(server.clone())
            .run(&UsernameScanner)
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Authentication { .. }));
        assert_eq!(server.sign_in_calls(), 1);
        // No session was established, so nothing to sign out.
        assert_eq!(server.sign_out_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_sites_requires_connection() {
        let coordinator = coordinator(Arc::new(three_sites()));
        assert!(coordinator.list_sites().await.is_err());
    }
}
