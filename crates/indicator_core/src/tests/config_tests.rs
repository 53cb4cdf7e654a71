use super::*;

#[test]
fn default_config_is_ordered() {
    let config = LoadingConfig::default();
    assert!(config.min_loading_time() <= config.max_loading_time());
    assert_eq!(config.delay_start(), DEFAULT_DELAY_START);
}

#[test]
fn accepts_zero_durations_and_equal_bounds() {
    let config = LoadingConfig::from_millis(0, 0, 0).expect("zero config");
    assert_eq!(config.delay_start(), Duration::ZERO);

    let config = LoadingConfig::from_millis(50, 400, 400).expect("equal bounds");
    assert_eq!(config.min_loading_time(), config.max_loading_time());
}

#[test]
fn rejects_negative_durations_naming_the_field() {
    assert_eq!(
        LoadingConfig::from_millis(-1, 300, 5000),
        Err(ConfigError::NegativeDuration {
            field: "delay_start",
            value_ms: -1
        })
    );
    assert_eq!(
        LoadingConfig::from_millis(100, 300, -5000),
        Err(ConfigError::NegativeDuration {
            field: "max_loading_time",
            value_ms: -5000
        })
    );
}

#[test]
fn rejects_min_above_max() {
    let err = LoadingConfig::new(
        Duration::from_millis(100),
        Duration::from_millis(600),
        Duration::from_millis(500),
    )
    .expect_err("min > max");

    assert_eq!(
        err,
        ConfigError::MinExceedsMax {
            min_ms: 600,
            max_ms: 500
        }
    );
    assert_eq!(
        err.to_string(),
        "min_loading_time (600ms) exceeds max_loading_time (500ms)"
    );
}
