//! The retry executor and its scoped variant.

use crate::audit::AuditSink;
use crate::core::{GovernanceError, SweepResult};
use crate::retry::policy::RetryPolicy;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Executes operations under a [`RetryPolicy`], reporting every attempt
/// to an [`AuditSink`].
///
/// # Example
///
/// ```rust,ignore
/// let executor = RetryExecutor::new(RetryPolicy::api(), sink);
/// let sites = executor
///     .execute("list_sites", || client.list_sites(&token))
///     .await?;
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sink: Arc<dyn AuditSink>,
}

impl RetryExecutor {
    /// Creates an executor with the given policy and sink.
    pub fn new(policy: RetryPolicy, sink: Arc<dyn AuditSink>) -> Self {
        Self { policy, sink }
    }

    /// Returns the policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns an executor with the same sink but a different policy.
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            policy,
            sink: Arc::clone(&self.sink),
        }
    }

    /// Runs `operation` until it succeeds, fails fatally, or exhausts the
    /// attempt budget.
    ///
    /// The closure performs one attempt per invocation. A fatal
    /// (non-retryable) error propagates immediately; a retryable error is
    /// absorbed, the backoff delay slept, and the operation re-invoked,
    /// at most [`RetryPolicy::max_attempts`] times beyond the first
    /// attempt. The final error is returned unchanged after the budget is
    /// spent.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut op: F) -> SweepResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SweepResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let started = Instant::now();
            match op().await {
                Ok(value) => {
                    self.sink
                        .operation_succeeded(operation, attempt, started.elapsed());
                    return Ok(value);
                }
                Err(error) => {
                    let retryable = error.is_retryable();
                    if !retryable || !self.policy.should_retry(attempt) {
                        self.sink
                            .operation_failed(operation, attempt, &error, retryable);
                        return Err(error);
                    }

                    let delay = self.policy.jittered_delay(attempt);
                    self.sink.retry_scheduled(operation, attempt, delay, &error);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Opens a caller-driven retry scope for a named operation.
    pub fn scope(&self, operation: impl Into<String>) -> RetryScope {
        RetryScope {
            operation: operation.into(),
            policy: self.policy.clone(),
            sink: Arc::clone(&self.sink),
            attempt: 0,
        }
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish()
    }
}

/// Caller-driven retry scope over the same policy engine.
///
/// The caller owns the loop and feeds each failure to [`absorb`]: a
/// retryable error with budget remaining is suppressed (after sleeping
/// the backoff delay), telling the caller to run another attempt; a fatal
/// error or an exhausted budget is handed back for propagation.
///
/// ```rust,ignore
/// let mut scope = executor.scope("refresh_schedules");
/// let schedules = loop {
///     match session.list_schedules().await {
///         Ok(schedules) => break schedules,
///         Err(error) => scope.absorb(error).await?,
///     }
/// };
/// ```
///
/// [`absorb`]: RetryScope::absorb
pub struct RetryScope {
    operation: String,
    policy: RetryPolicy,
    sink: Arc<dyn AuditSink>,
    attempt: u32,
}

impl RetryScope {
    /// Returns the 0-based index of the attempt currently underway.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Absorbs a failure from the current attempt.
    ///
    /// Returns `Ok(())` when the error was retryable and budget remains:
    /// the backoff delay has been slept and the caller should loop into
    /// the next attempt. Returns the error itself when it is fatal or the
    /// budget is exhausted.
    pub async fn absorb(&mut self, error: GovernanceError) -> SweepResult<()> {
        let retryable = error.is_retryable();
        if !retryable || !self.policy.should_retry(self.attempt) {
            self.sink
                .operation_failed(&self.operation, self.attempt, &error, retryable);
            return Err(error);
        }

        let delay = self.policy.jittered_delay(self.attempt);
        self.sink
            .retry_scheduled(&self.operation, self.attempt, delay, &error);
        tokio::time::sleep(delay).await;
        self.attempt += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records retry decisions for assertions.
    #[derive(Default)]
    struct RecordingSink {
        delays: Mutex<Vec<Duration>>,
        failures: Mutex<Vec<(u32, bool)>>,
    }

    impl AuditSink for RecordingSink {
        fn retry_scheduled(
            &self,
            _operation: &str,
            _attempt: u32,
            delay: Duration,
            _error: &GovernanceError,
        ) {
            self.delays.lock().unwrap().push(delay);
        }

        fn operation_failed(
            &self,
            _operation: &str,
            attempts: u32,
            _error: &GovernanceError,
            retryable: bool,
        ) {
            self.failures.lock().unwrap().push((attempts, retryable));
        }
    }

    fn executor(policy: RetryPolicy) -> (RetryExecutor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (RetryExecutor::new(policy, sink.clone()), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_invokes_n_plus_one_times() {
        let (executor, _sink) = executor(RetryPolicy::api().with_jitter(false));
        let calls = AtomicU32::new(0);

        let result: SweepResult<()> = executor
            .execute("always_fails", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GovernanceError::server(503, "unavailable")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(
            result,
            Err(GovernanceError::Server {
                status: Some(503),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fatal_error_invokes_once() {
        let (executor, sink) = executor(RetryPolicy::api().with_jitter(false));
        let calls = AtomicU32::new(0);

        let result: SweepResult<()> = executor
            .execute("not_found", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GovernanceError::server(404, "not found")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
        // No delay was ever scheduled and the failure is marked fatal.
        assert!(sink.delays.lock().unwrap().is_empty());
        assert_eq!(*sink.failures.lock().unwrap(), vec![(0, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let (executor, sink) = executor(
            RetryPolicy::api()
                .with_jitter(false)
                .with_base_delay(Duration::from_secs(1))
                .with_multiplier(2.0)
                .with_max_delay(Duration::from_secs(30)),
        );
        let calls = AtomicU32::new(0);

        // Fails with 503 on attempts 0, 1, 2; succeeds on attempt 3.
        let result = executor
            .execute("flaky", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 3 {
                        Err(GovernanceError::server(503, "unavailable"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            *sink.delays.lock().unwrap(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_at_first_retry() {
        let (executor, _sink) = executor(RetryPolicy::api().with_jitter(false));
        let calls = AtomicU32::new(0);

        let result = executor
            .execute("once_flaky", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(GovernanceError::connection("reset by peer"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_max_attempts_means_single_attempt() {
        let (executor, _sink) = executor(RetryPolicy::no_retry());
        let calls = AtomicU32::new(0);

        let result: SweepResult<()> = executor
            .execute("single_shot", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GovernanceError::server(503, "unavailable")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_success_skips_sink_failure_events() {
        let (executor, sink) = executor(RetryPolicy::api());

        let value = executor.execute("ok", || async { Ok(7) }).await.unwrap();

        assert_eq!(value, 7);
        assert!(sink.failures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_absorbs_then_succeeds() {
        let (executor, sink) = executor(RetryPolicy::api().with_jitter(false));
        let mut scope = executor.scope("stepwise");
        let calls = AtomicU32::new(0);

        let value = loop {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            let outcome: SweepResult<u32> = if call < 2 {
                Err(GovernanceError::server(502, "bad gateway"))
            } else {
                Ok(99)
            };
            match outcome {
                Ok(v) => break v,
                Err(e) => scope.absorb(e).await.unwrap(),
            }
        };

        assert_eq!(value, 99);
        assert_eq!(scope.attempt(), 2);
        assert_eq!(sink.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scope_propagates_fatal() {
        let (executor, _sink) = executor(RetryPolicy::api());
        let mut scope = executor.scope("fatal");

        let err = scope
            .absorb(GovernanceError::authentication("bad token"))
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Authentication { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_propagates_after_exhaustion() {
        let (executor, _sink) =
            executor(RetryPolicy::api().with_jitter(false).with_max_attempts(1));
        let mut scope = executor.scope("exhausted");

        scope
            .absorb(GovernanceError::server(503, "unavailable"))
            .await
            .unwrap();
        let err = scope
            .absorb(GovernanceError::server(503, "unavailable"))
            .await
            .unwrap_err();

        assert!(err.is_server_error());
    }
}
