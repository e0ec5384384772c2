use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound on attempts per remote call, retries included.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;
/// Upper bound on any single wait between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How many times a remote call is attempted and how long to wait between
/// attempts. The schedule holds the wait after attempt `i` at index `i - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Vec<Duration>,
}

impl RetryPolicy {
    /// Builds a policy from an explicit schedule.
    ///
    /// The schedule must be non-decreasing and no wait may exceed
    /// [`MAX_BACKOFF`]. When it is shorter than `max_attempts - 1`, its last
    /// entry is reused for the remaining waits.
    pub fn new(max_attempts: u32, backoff: Vec<Duration>) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::RetryPolicy(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ConfigError::RetryPolicy(format!(
                "max attempts must be at most {MAX_ATTEMPTS_LIMIT}, got {max_attempts}"
            )));
        }
        if backoff.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ConfigError::RetryPolicy(
                "backoff schedule must be non-decreasing".to_string(),
            ));
        }
        if let Some(longest) = backoff.last().filter(|d| **d > MAX_BACKOFF) {
            return Err(ConfigError::RetryPolicy(format!(
                "backoff of {longest:?} exceeds the {MAX_BACKOFF:?} limit"
            )));
        }
        if max_attempts > 1 && backoff.is_empty() {
            return Err(ConfigError::RetryPolicy(
                "a backoff schedule is required when retries are enabled".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// Linear backoff: the wait after attempt `i` is `i * base`.
    pub fn linear(max_attempts: u32, base: Duration) -> Result<Self, ConfigError> {
        if max_attempts > MAX_ATTEMPTS_LIMIT {
            return Self::new(max_attempts, Vec::new());
        }
        let backoff = (1..max_attempts)
            .map(|i| {
                base.checked_mul(i).ok_or_else(|| {
                    ConfigError::RetryPolicy(format!("backoff of {base:?} x {i} overflows"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(max_attempts, backoff)
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Vec::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn schedule(&self) -> &[Duration] {
        &self.backoff
    }

    /// Wait before the attempt that follows `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: (1..DEFAULT_MAX_ATTEMPTS)
                .map(|i| DEFAULT_BASE_DELAY * i)
                .collect(),
        }
    }
}
