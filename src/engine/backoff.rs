use rand::Rng;
use std::time::Duration;

use crate::domain::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(600),
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_backoff.is_zero() {
            return Err(ConfigError::InvalidBackoff(
                "minimum backoff must be greater than 0".to_string(),
            ));
        }
        if self.max_backoff < self.min_backoff {
            return Err(ConfigError::InvalidBackoff(format!(
                "maximum backoff ({:?}) is below minimum backoff ({:?})",
                self.max_backoff, self.min_backoff
            )));
        }
        Ok(())
    }
}

/// Tracks consecutive failed cycles and stretches the idle interval while
/// the endpoint keeps failing. Batches themselves are never retried.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    period: Duration,
    policy: BackoffPolicy,
    failures_since_success: u32,
}

impl ConnectionStatus {
    pub fn new(period: Duration, policy: BackoffPolicy) -> Self {
        Self {
            period,
            policy,
            failures_since_success: 0,
        }
    }

    pub fn mark_success(&mut self) {
        self.failures_since_success = 0;
    }

    pub fn mark_failure(&mut self) {
        self.failures_since_success = self.failures_since_success.saturating_add(1);
    }

    pub fn failures_since_success(&self) -> u32 {
        self.failures_since_success
    }

    /// Idle time before the next time-triggered cycle.
    pub fn next_interval(&self) -> Duration {
        if self.failures_since_success == 0 {
            return self.period;
        }

        // 2^31 * min_backoff already saturates any sane cap
        let exponent = (self.failures_since_success - 1).min(31);
        let backed_off = self
            .policy
            .min_backoff
            .checked_mul(1_u32 << exponent)
            .unwrap_or(self.policy.max_backoff);
        let capped = backed_off.min(self.policy.max_backoff);
        let interval = capped.max(self.period);

        if self.policy.jitter {
            apply_jitter(interval).max(self.period)
        } else {
            interval
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5);
    Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64)
}
