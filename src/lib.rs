//! # Sitesweep
//!
//! Multi-site governance sweeps for BI server deployments: retry-aware
//! scanning, staleness reports, and audit logging.
//!
//! ## Overview
//!
//! Sitesweep authenticates once against a server's REST API, enumerates
//! every site, and runs a governance scanner inside each site in turn,
//! letting you:
//!
//! - Flag users, workbooks, and datasources past a staleness threshold
//! - Analyze extract-refresh schedules against peak business hours
//! - Survive transient server failures with bounded, jittered retries
//! - Skip an unreachable site without losing the rest of the sweep
//! - Persist one standardized JSON report per run, plus a daily rollup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sitesweep::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GovernanceError> {
//!     let config = GovernanceConfig::from_file("sweep_config.json")?;
//!     let client = Arc::new(RestClient::new(RestConfig::new(&config.server_url))?);
//!
//!     let coordinator = SweepCoordinator::builder()
//!         .client(client)
//!         .config(config.clone())
//!         .build()?;
//!
//!     let scanner = StaleUserScanner::new(config.stale_user_days);
//!     let outcome = coordinator.run(&scanner).await?;
//!
//!     let writer = ReportWriter::from_config(&config);
//!     writer
//!         .write(
//!             &outcome.items,
//!             "inactive_users",
//!             &format!("{} inactive users found", outcome.items.len()),
//!             Default::default(),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the `rest` client
//! - `rest` - REST implementation of the server protocol via reqwest
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Fundamental types, configuration, and error handling
//! - **Retry**: Exponential backoff with jitter over classified errors
//! - **Client**: The server protocol trait, its REST and mock
//!   implementations, and the authenticated session
//! - **Sweep**: Orchestration of scans across all sites with
//!   partial-failure tolerance
//! - **Scanners**: Per-resource staleness and schedule analysis
//! - **Audit**: Structured, correlation-tagged event logging
//! - **Report**: Standardized JSON documents and the daily summary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod client;
pub mod core;
pub mod report;
pub mod retry;
pub mod scanners;
pub mod sweep;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Credentials, GovernanceConfig, GovernanceError, RunContext, Site, SweepResult,
};

pub use crate::audit::{AuditSink, NoopSink, TracingSink};
pub use crate::client::{AuthToken, MockServer, ServerClient, Session};
pub use crate::report::{compose_daily_summary, ReportWriter, RunDocument};
pub use crate::retry::{RetryExecutor, RetryPolicy, RetryScope};
pub use crate::scanners::{
    ExtractTaskScanner, SiteScanner, StaleContentScanner, StaleUserScanner,
};
pub use crate::sweep::{SweepCoordinator, SweepOutcome};

#[cfg(feature = "rest")]
pub use crate::client::{RestClient, RestConfig};

/// Prelude module for convenient imports.
///
/// ```rust
/// use sitesweep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audit::{AuditSink, NoopSink, TracingSink};
    pub use crate::client::{AuthToken, MockServer, ServerClient, Session};
    pub use crate::core::{
        Credentials, GovernanceConfig, GovernanceError, RunContext, Site, SweepResult,
    };
    pub use crate::report::{compose_daily_summary, ReportWriter, RunDocument};
    pub use crate::retry::{RetryExecutor, RetryPolicy, RetryScope};
    pub use crate::scanners::{
        scan_stale_sites, ExtractTaskScanner, SiteScanner, StaleContentScanner, StaleUserScanner,
    };
    pub use crate::sweep::{SweepCoordinator, SweepOutcome};

    #[cfg(feature = "rest")]
    pub use crate::client::{RestClient, RestConfig};
}
