use thiserror::Error;

/// Rejected loading configuration. This is the only error the indicator
/// controller defines; every runtime operation is total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must not be negative (got {value_ms}ms)")]
    NegativeDuration { field: &'static str, value_ms: i64 },
    #[error("min_loading_time ({min_ms}ms) exceeds max_loading_time ({max_ms}ms)")]
    MinExceedsMax { min_ms: u64, max_ms: u64 },
}
