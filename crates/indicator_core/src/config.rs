use std::time::Duration;

use shared::error::ConfigError;

pub const DEFAULT_DELAY_START: Duration = Duration::from_millis(200);
pub const DEFAULT_MIN_LOADING_TIME: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_LOADING_TIME: Duration = Duration::from_secs(10);

/// Timing bounds for one controller. Immutable once built; construction
/// guarantees `min_loading_time <= max_loading_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingConfig {
    delay_start: Duration,
    min_loading_time: Duration,
    max_loading_time: Duration,
}

impl LoadingConfig {
    pub fn new(
        delay_start: Duration,
        min_loading_time: Duration,
        max_loading_time: Duration,
    ) -> Result<Self, ConfigError> {
        if min_loading_time > max_loading_time {
            return Err(ConfigError::MinExceedsMax {
                min_ms: duration_ms(min_loading_time),
                max_ms: duration_ms(max_loading_time),
            });
        }

        Ok(Self {
            delay_start,
            min_loading_time,
            max_loading_time,
        })
    }

    /// Builds a config from raw millisecond values as they appear in settings
    /// files and environment variables.
    pub fn from_millis(
        delay_start_ms: i64,
        min_loading_time_ms: i64,
        max_loading_time_ms: i64,
    ) -> Result<Self, ConfigError> {
        Self::new(
            non_negative("delay_start", delay_start_ms)?,
            non_negative("min_loading_time", min_loading_time_ms)?,
            non_negative("max_loading_time", max_loading_time_ms)?,
        )
    }

    pub fn delay_start(&self) -> Duration {
        self.delay_start
    }

    pub fn min_loading_time(&self) -> Duration {
        self.min_loading_time
    }

    pub fn max_loading_time(&self) -> Duration {
        self.max_loading_time
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            delay_start: DEFAULT_DELAY_START,
            min_loading_time: DEFAULT_MIN_LOADING_TIME,
            max_loading_time: DEFAULT_MAX_LOADING_TIME,
        }
    }
}

fn non_negative(field: &'static str, value_ms: i64) -> Result<Duration, ConfigError> {
    u64::try_from(value_ms)
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::NegativeDuration { field, value_ms })
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
