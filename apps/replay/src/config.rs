use std::{fs, io, path::Path};

use anyhow::{bail, Context};
use indicator_core::{
    ConfigError, LoadingConfig, DEFAULT_DELAY_START, DEFAULT_MAX_LOADING_TIME,
    DEFAULT_MIN_LOADING_TIME,
};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "indicator.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub delay_start_ms: i64,
    pub min_loading_time_ms: i64,
    pub max_loading_time_ms: i64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_start_ms: millis(DEFAULT_DELAY_START),
            min_loading_time_ms: millis(DEFAULT_MIN_LOADING_TIME),
            max_loading_time_ms: millis(DEFAULT_MAX_LOADING_TIME),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn loading_config(&self) -> Result<LoadingConfig, ConfigError> {
        LoadingConfig::from_millis(
            self.delay_start_ms,
            self.min_loading_time_ms,
            self.max_loading_time_ms,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    delay_start_ms: Option<i64>,
    min_loading_time_ms: Option<i64>,
    max_loading_time_ms: Option<i64>,
    log_filter: Option<String>,
}

/// Defaults, then the settings file, then `APP__*` environment variables.
///
/// An explicit `path` must exist; the default `indicator.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.delay_start_ms {
        settings.delay_start_ms = v;
    }
    if let Some(v) = file_cfg.min_loading_time_ms {
        settings.min_loading_time_ms = v;
    }
    if let Some(v) = file_cfg.max_loading_time_ms {
        settings.max_loading_time_ms = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }

    Ok(())
}

pub(crate) fn apply_env<F>(settings: &mut Settings, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("APP__DELAY_START_MS") {
        settings.delay_start_ms = parse_ms("APP__DELAY_START_MS", &v)?;
    }
    if let Some(v) = lookup("APP__MIN_LOADING_TIME_MS") {
        settings.min_loading_time_ms = parse_ms("APP__MIN_LOADING_TIME_MS", &v)?;
    }
    if let Some(v) = lookup("APP__MAX_LOADING_TIME_MS") {
        settings.max_loading_time_ms = parse_ms("APP__MAX_LOADING_TIME_MS", &v)?;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(())
}

fn parse_ms(key: &str, raw: &str) -> anyhow::Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) => bail!("{key} must be a whole number of milliseconds, got '{raw}'"),
    }
}

fn millis(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
