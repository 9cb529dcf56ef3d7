//! Retry policy and backoff schedule.

use std::time::Duration;

/// Configuration for retry behavior.
///
/// `max_attempts` counts retries beyond the first attempt: an operation
/// runs at most `max_attempts + 1` times, and `max_attempts = 0` means a
/// single attempt with no retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_attempts: u32,

    /// Delay after the first failing attempt.
    pub base_delay: Duration,

    /// Ceiling on any single delay.
    pub max_delay: Duration,

    /// Multiplier applied per attempt for exponential backoff.
    pub multiplier: f64,

    /// Whether to perturb delays by a uniform ±25% to avoid thundering
    /// herds.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::api()
    }
}

impl RetryPolicy {
    /// Standard policy for ordinary API calls: 3 retries from a 1 second
    /// base.
    pub fn api() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// Faster policy for sign-in: 2 retries from a half-second base.
    pub fn auth() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            ..Self::api()
        }
    }

    /// Patient policy for heavy listing calls: 5 retries, delays up to a
    /// minute.
    pub fn heavy() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            ..Self::api()
        }
    }

    /// Disables retries entirely.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::api()
        }
    }

    /// Sets the maximum number of retries.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier, floored at 1.0.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns whether a retry is allowed after the given 0-based failing
    /// attempt.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Returns the total number of invocations this policy permits.
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts + 1
    }

    /// Computes the backoff delay after a given failing attempt (0-based),
    /// before jitter: `min(base_delay * multiplier^attempt, max_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Computes the delay for an attempt with jitter applied when enabled.
    ///
    /// The perturbation is a uniform factor in `[-25%, +25%]` of the base
    /// schedule, clamped to a non-negative floor.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        if !self.jitter {
            return delay;
        }

        use rand::Rng;
        let offset: f64 = rand::thread_rng().gen_range(-0.25..=0.25);
        let perturbed = (delay.as_secs_f64() * (1.0 + offset)).max(0.0);
        Duration::from_secs_f64(perturbed)
    }
}
