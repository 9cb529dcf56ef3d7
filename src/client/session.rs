//! The authenticated session handle.

use crate::client::traits::{ArcServerClient, AuthToken};
use crate::core::{
    Credentials, Datasource, ExtractTask, Schedule, Site, SweepResult, User, Workbook,
};
use crate::retry::RetryExecutor;

/// A single authenticated handle to the server.
///
/// A session is established once per run, owned exclusively by the sweep
/// coordinator, and must be closed on every exit path. Every listing call
/// goes through the retry executor, so transient server failures are
/// invisible to callers unless the attempt budget is exhausted.
///
/// Dropping a session without [`close`](Session::close) leaks the token on
/// the server until it expires; a warning is logged when that happens.
#[derive(Debug)]
pub struct Session {
    client: ArcServerClient,
    token: AuthToken,
    executor: RetryExecutor,
    closed: bool,
}

impl Session {
    /// Wraps an already-issued token into a session.
    ///
    /// Used by the sweep coordinator, which performs sign-in under its
    /// own auth retry policy. Prefer [`establish`](Session::establish)
    /// when the default policy fits.
    pub fn new(client: ArcServerClient, token: AuthToken, executor: RetryExecutor) -> Self {
        Self {
            client,
            token,
            executor,
            closed: false,
        }
    }

    /// Signs in and returns the established session.
    ///
    /// The sign-in itself runs under the executor's policy, since
    /// transient network failures during authentication are common.
    pub async fn establish(
        client: ArcServerClient,
        credentials: &Credentials,
        executor: RetryExecutor,
    ) -> SweepResult<Self> {
        let token = executor
            .execute("sign_in", || client.sign_in(credentials))
            .await?;

        tracing::info!(site_id = %token.site_id, "session established");

        Ok(Self::new(client, token, executor))
    }

    /// Returns the identifier of the site the session is currently bound
    /// to (empty at the server level).
    pub fn site_id(&self) -> &str {
        &self.token.site_id
    }

    /// Lists every site on the server.
    pub async fn list_sites(&self) -> SweepResult<Vec<Site>> {
        self.executor
            .execute("list_sites", || self.client.list_sites(&self.token))
            .await
    }

    /// Switches the session's context to the given site.
    pub async fn switch_site(&mut self, site: &Site) -> SweepResult<()> {
        let token = self
            .executor
            .execute("switch_site", || self.client.switch_site(&self.token, site))
            .await?;
        self.token = token;
        Ok(())
    }

    /// Lists the users of the current site.
    pub async fn list_users(&self) -> SweepResult<Vec<User>> {
        self.executor
            .execute("list_users", || self.client.list_users(&self.token))
            .await
    }

    /// Lists the workbooks of the current site.
    pub async fn list_workbooks(&self) -> SweepResult<Vec<Workbook>> {
        self.executor
            .execute("list_workbooks", || self.client.list_workbooks(&self.token))
            .await
    }

    /// Lists the published datasources of the current site.
    pub async fn list_datasources(&self) -> SweepResult<Vec<Datasource>> {
        self.executor
            .execute("list_datasources", || {
                self.client.list_datasources(&self.token)
            })
            .await
    }

    /// Lists the extract-refresh tasks of the current site.
    pub async fn list_tasks(&self) -> SweepResult<Vec<ExtractTask>> {
        self.executor
            .execute("list_tasks", || self.client.list_tasks(&self.token))
            .await
    }

    /// Lists the refresh schedules of the current site.
    pub async fn list_schedules(&self) -> SweepResult<Vec<Schedule>> {
        self.executor
            .execute("list_schedules", || self.client.list_schedules(&self.token))
            .await
    }

    /// Signs out, invalidating the token.
    ///
    /// Consumes the session; it cannot be used afterwards.
    pub async fn close(mut self) -> SweepResult<()> {
        self.closed = true;
        self.client.sign_out(&self.token).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                site_id = %self.token.site_id,
                "session dropped without sign-out; token leaked until server-side expiry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopSink;
    use crate::client::mock::MockServer;
    use crate::retry::RetryPolicy;
    use std::sync::Arc;

    fn executor() -> RetryExecutor {
        RetryExecutor::new(RetryPolicy::api().with_jitter(false), Arc::new(NoopSink))
    }

    fn credentials() -> Credentials {
        Credentials::new("ci-token", "s3cret")
    }

    #[tokio::test]
    async fn test_establish_and_close() {
        let server = Arc::new(MockServer::new().with_site(MockServer::site("s1", "Finance")));
        let session = Session::establish(server.clone(), &credentials(), executor())
            .await
            .unwrap();

        assert_eq!(session.site_id(), "");
        session.close().await.unwrap();
        assert_eq!(server.sign_out_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_establish_retries_transient_sign_in_failures() {
        let server = Arc::new(MockServer::new().fail_sign_in_attempts(2));
        let session = Session::establish(server.clone(), &credentials(), executor())
            .await
            .unwrap();

        assert_eq!(server.sign_in_calls(), 3);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_establish_does_not_retry_rejected_credentials() {
        let server = Arc::new(MockServer::new().reject_credentials());
        let err = Session::establish(server.clone(), &credentials(), executor())
            .await
            .unwrap_err();

        assert!(matches!(err, crate::core::GovernanceError::Authentication { .. }));
        assert_eq!(server.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn test_switch_site_rebinds_token() {
        let site = MockServer::site("s1", "Finance");
        let server = Arc::new(MockServer::new().with_site(site.clone()));
        let mut session = Session::establish(server.clone(), &credentials(), executor())
            .await
            .unwrap();

        session.switch_site(&site).await.unwrap();
        assert_eq!(session.site_id(), "s1");
        session.close().await.unwrap();
    }
}
