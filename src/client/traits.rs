//! The server protocol trait.

use crate::core::{Credentials, Datasource, ExtractTask, Schedule, Site, SweepResult, User, Workbook};

use async_trait::async_trait;
use std::fmt::Debug;

/// An authenticated token returned by the server.
///
/// Tokens are scoped to one site context; [`ServerClient::switch_site`]
/// exchanges a token for one bound to another site. An empty `site_id`
/// denotes the server-level context used for site enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Opaque token value presented on subsequent calls.
    pub value: String,

    /// Identifier of the site this token is currently bound to.
    pub site_id: String,
}

impl AuthToken {
    /// Creates a token bound to the server-level context.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            site_id: String::new(),
        }
    }

    /// Binds the token to a site context.
    pub fn for_site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = site_id.into();
        self
    }
}

/// The capabilities governance sweeps need from the BI server.
///
/// Implementations must be `Send + Sync` and should never panic; every
/// failure mode maps to a [`GovernanceError`](crate::core::GovernanceError)
/// variant. A "server responded with error" condition must surface as
/// `GovernanceError::Server` carrying the HTTP-like status code when one
/// is available, since the retry executor and the sweep coordinator both
/// classify on it.
#[async_trait]
pub trait ServerClient: Send + Sync + Debug {
    /// Exchanges credentials for an authenticated token.
    async fn sign_in(&self, credentials: &Credentials) -> SweepResult<AuthToken>;

    /// Invalidates the token on the server.
    async fn sign_out(&self, token: &AuthToken) -> SweepResult<()>;

    /// Lists every site on the server, in server enumeration order.
    async fn list_sites(&self, token: &AuthToken) -> SweepResult<Vec<Site>>;

    /// Exchanges the token for one bound to the given site's context.
    async fn switch_site(&self, token: &AuthToken, site: &Site) -> SweepResult<AuthToken>;

    /// Lists the users of the token's current site.
    async fn list_users(&self, token: &AuthToken) -> SweepResult<Vec<User>>;

    /// Lists the workbooks of the token's current site.
    async fn list_workbooks(&self, token: &AuthToken) -> SweepResult<Vec<Workbook>>;

    /// Lists the published datasources of the token's current site.
    async fn list_datasources(&self, token: &AuthToken) -> SweepResult<Vec<Datasource>>;

    /// Lists the extract-refresh tasks of the token's current site.
    async fn list_tasks(&self, token: &AuthToken) -> SweepResult<Vec<ExtractTask>>;

    /// Lists the refresh schedules of the token's current site.
    async fn list_schedules(&self, token: &AuthToken) -> SweepResult<Vec<Schedule>>;
}

/// An arc-wrapped client for shared ownership.
pub type ArcServerClient = std::sync::Arc<dyn ServerClient>;
