//! Audit sink trait and the tracing-backed implementation.

use crate::core::{GovernanceError, RunContext, Site};

use std::time::Duration;

/// Receiver for structured audit events.
///
/// Implementations must be cheap and infallible: the retry executor and
/// sweep coordinator call into the sink on every attempt and every site,
/// and correctness never depends on what the sink does with the events.
///
/// All methods have no-op defaults so implementations only override what
/// they care about.
pub trait AuditSink: Send + Sync {
    /// An operation succeeded, possibly after retries.
    fn operation_succeeded(&self, operation: &str, attempt: u32, elapsed: Duration) {
        let _ = (operation, attempt, elapsed);
    }

    /// A retryable failure was absorbed; the operation will run again
    /// after `delay`.
    fn retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &GovernanceError,
    ) {
        let _ = (operation, attempt, delay, error);
    }

    /// An operation failed for good: either the error was fatal or the
    /// attempt budget is exhausted.
    fn operation_failed(
        &self,
        operation: &str,
        attempts: u32,
        error: &GovernanceError,
        retryable: bool,
    ) {
        let _ = (operation, attempts, error, retryable);
    }

    /// A per-site scan is starting.
    fn site_scan_started(&self, site: &Site, resource: &str) {
        let _ = (site, resource);
    }

    /// A per-site scan finished and contributed `item_count` records.
    fn site_scan_completed(&self, site: &Site, resource: &str, item_count: usize, elapsed: Duration) {
        let _ = (site, resource, item_count, elapsed);
    }

    /// A per-site scan hit a server error and the site was skipped.
    fn site_scan_skipped(&self, site: &Site, resource: &str, error: &GovernanceError) {
        let _ = (site, resource, error);
    }

    /// A whole sweep finished.
    fn run_completed(
        &self,
        resource: &str,
        total_items: usize,
        sites_scanned: usize,
        sites_skipped: usize,
    ) {
        let _ = (resource, total_items, sites_scanned, sites_skipped);
    }
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AuditSink for NoopSink {}

/// The default sink: structured `tracing` events under `sitesweep::audit`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    context: RunContext,
}

impl TracingSink {
    /// Creates a sink for the given run context.
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    /// Returns the run context this sink stamps onto events.
    pub fn context(&self) -> &RunContext {
        &self.context
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(RunContext::new())
    }
}

impl AuditSink for TracingSink {
    fn operation_succeeded(&self, operation: &str, attempt: u32, elapsed: Duration) {
        if attempt > 0 {
            tracing::info!(
                target: "sitesweep::audit",
                correlation_id = %self.context.correlation_id,
                operation = %operation,
                successful_attempt = attempt + 1,
                duration_ms = elapsed.as_millis() as u64,
                "Retry succeeded"
            );
        } else {
            tracing::debug!(
                target: "sitesweep::audit",
                correlation_id = %self.context.correlation_id,
                operation = %operation,
                duration_ms = elapsed.as_millis() as u64,
                "Operation succeeded"
            );
        }
    }

    fn retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &GovernanceError,
    ) {
        tracing::warn!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            operation = %operation,
            attempt = attempt + 1,
            retry_delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retryable error, retry scheduled"
        );
    }

    fn operation_failed(
        &self,
        operation: &str,
        attempts: u32,
        error: &GovernanceError,
        retryable: bool,
    ) {
        tracing::error!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            operation = %operation,
            attempts = attempts + 1,
            error = %error,
            retryable,
            "Final failure"
        );
    }

    fn site_scan_started(&self, site: &Site, resource: &str) {
        tracing::info!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            site_name = %site.name,
            site_id = %site.id,
            resource = %resource,
            "Site scan started"
        );
    }

    fn site_scan_completed(&self, site: &Site, resource: &str, item_count: usize, elapsed: Duration) {
        tracing::info!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            site_name = %site.name,
            site_id = %site.id,
            resource = %resource,
            item_count,
            duration_ms = elapsed.as_millis() as u64,
            "Site scan completed"
        );
    }

    fn site_scan_skipped(&self, site: &Site, resource: &str, error: &GovernanceError) {
        tracing::warn!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            site_name = %site.name,
            site_id = %site.id,
            resource = %resource,
            error = %error,
            "Site scan skipped after server error"
        );
    }

    fn run_completed(
        &self,
        resource: &str,
        total_items: usize,
        sites_scanned: usize,
        sites_skipped: usize,
    ) {
        tracing::info!(
            target: "sitesweep::audit",
            correlation_id = %self.context.correlation_id,
            resource = %resource,
            total_items,
            sites_scanned,
            sites_skipped,
            "Sweep completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AdminMode;

    fn make_site() -> Site {
        Site {
            id: "s1".into(),
            name: "Finance".into(),
            content_url: "finance".into(),
            state: "Active".into(),
            admin_mode: AdminMode::ContentAndUsers,
            user_quota: None,
            storage_quota_mb: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_noop_sink_accepts_all_events() {
        let sink = NoopSink;
        let site = make_site();
        let err = GovernanceError::server(503, "unavailable");

        sink.operation_succeeded("list_sites", 0, Duration::from_millis(5));
        sink.retry_scheduled("list_sites", 0, Duration::from_secs(1), &err);
        sink.operation_failed("list_sites", 3, &err, true);
        sink.site_scan_started(&site, "users");
        sink.site_scan_completed(&site, "users", 10, Duration::from_millis(40));
        sink.site_scan_skipped(&site, "users", &err);
        sink.run_completed("users", 10, 3, 1);
    }

    #[test]
    fn test_tracing_sink_preserves_context() {
        let context = RunContext::new();
        let sink = TracingSink::new(context.clone());
        assert_eq!(sink.context().correlation_id, context.correlation_id);
    }
}
