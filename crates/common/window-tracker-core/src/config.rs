use bon::bon;

use crate::{TrackerError, TrackerResult};
use std::time::Duration;

pub const DEFAULT_HISTORY_CAPACITY: usize = 6;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

fn validate_history_capacity(capacity: usize) -> TrackerResult<usize> {
    if capacity == 0 {
        return Err(TrackerError::InvalidConfig {
            reason: "history capacity cannot be zero".into(),
        });
    }
    if capacity > 64 {
        return Err(TrackerError::InvalidConfig {
            reason: "history capacity cannot be greater than 64 entries".into(),
        });
    }
    Ok(capacity)
}

fn validate_max_retries(retries: u32) -> TrackerResult<u32> {
    if retries == 0 {
        return Err(TrackerError::InvalidConfig {
            reason: "max retries cannot be zero".into(),
        });
    }
    if retries > 10 {
        return Err(TrackerError::InvalidConfig {
            reason: "max retries cannot be greater than 10".into(),
        });
    }
    Ok(retries)
}

fn validate_retry_backoff(backoff: Duration) -> TrackerResult<Duration> {
    if backoff > Duration::from_secs(10) {
        return Err(TrackerError::InvalidConfig {
            reason: "retry backoff cannot be greater than 10 seconds".into(),
        });
    }
    Ok(backoff)
}

fn validate_settle_delay(delay: Duration) -> TrackerResult<Duration> {
    if delay > Duration::from_secs(1) {
        return Err(TrackerError::InvalidConfig {
            reason: "input settle delay cannot be greater than 1 second".into(),
        });
    }
    Ok(delay)
}

fn validate_bootstrap_timeout(timeout: Duration) -> TrackerResult<Duration> {
    if timeout.is_zero() {
        return Err(TrackerError::InvalidConfig {
            reason: "bootstrap timeout cannot be zero".into(),
        });
    }
    if timeout > Duration::from_secs(30) {
        return Err(TrackerError::InvalidConfig {
            reason: "bootstrap timeout cannot be greater than 30 seconds".into(),
        });
    }
    Ok(timeout)
}

fn validate_probe_limit(limit: usize) -> TrackerResult<usize> {
    if limit == 0 || limit > 64 {
        return Err(TrackerError::InvalidConfig {
            reason: "activity probe limit must be between 1 and 64".into(),
        });
    }
    Ok(limit)
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum number of entries kept in the recency history.
    pub history_capacity: usize,
    /// Full passes over the strategy list before an activation gives up.
    pub max_retries: u32,
    /// Pause between two failed passes.
    pub retry_backoff: Duration,
    /// Pause after synthesized input so the window manager can react.
    pub input_settle_delay: Duration,
    /// Upper bound for the whole bootstrap pipeline.
    pub bootstrap_timeout: Duration,
    /// How many ranked processes the activity probe inspects.
    pub activity_probe_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_secs(1),
            input_settle_delay: Duration::from_millis(100),
            bootstrap_timeout: Duration::from_secs(3),
            activity_probe_limit: 10,
        }
    }
}

#[bon]
impl TrackerConfig {
    /// Creates a new tracker configuration using the builder pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use window_tracker_core::TrackerConfig;
    /// use std::time::Duration;
    ///
    /// let config = TrackerConfig::builder()
    ///     .history_capacity(8)
    ///     .unwrap()
    ///     .retry_backoff(Duration::from_millis(250))
    ///     .unwrap()
    ///     .build();
    /// assert_eq!(config.history_capacity, 8);
    /// ```
    #[builder]
    pub fn new(
        #[builder(
            default = DEFAULT_HISTORY_CAPACITY,
            with = |capacity: usize| -> Result<_, TrackerError> {
                validate_history_capacity(capacity)
            },
        )]
        history_capacity: usize,
        #[builder(
            default = DEFAULT_MAX_RETRIES,
            with = |retries: u32| -> Result<_, TrackerError> {
                validate_max_retries(retries)
            },
        )]
        max_retries: u32,
        #[builder(
            default = Duration::from_secs(1),
            with = |backoff: Duration| -> Result<_, TrackerError> {
                validate_retry_backoff(backoff)
            },
        )]
        retry_backoff: Duration,
        #[builder(
            default = Duration::from_millis(100),
            with = |delay: Duration| -> Result<_, TrackerError> {
                validate_settle_delay(delay)
            },
        )]
        input_settle_delay: Duration,
        #[builder(
            default = Duration::from_secs(3),
            with = |timeout: Duration| -> Result<_, TrackerError> {
                validate_bootstrap_timeout(timeout)
            },
        )]
        bootstrap_timeout: Duration,
        #[builder(
            default = 10,
            with = |limit: usize| -> Result<_, TrackerError> {
                validate_probe_limit(limit)
            },
        )]
        activity_probe_limit: usize,
    ) -> Self {
        Self {
            history_capacity,
            max_retries,
            retry_backoff,
            input_settle_delay,
            bootstrap_timeout,
            activity_probe_limit,
        }
    }
}
