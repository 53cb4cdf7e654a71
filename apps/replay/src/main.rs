use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod script;

use config::{load_settings, Settings};

/// Replays a trigger script through the busy indicator controller and prints
/// every visibility transition.
#[derive(Parser, Debug)]
struct Args {
    /// JSON-lines script of timed navigation, ready and manual steps.
    #[arg(long)]
    script: PathBuf,
    /// Settings file; defaults to ./indicator.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, allow_negative_numbers = true)]
    delay_start_ms: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    min_loading_time_ms: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    max_loading_time_ms: Option<i64>,
    /// Emit one JSON record per event instead of text.
    #[arg(long)]
    json: bool,
    /// Run on a paused clock so the replay finishes instantly and deterministically.
    #[arg(long)]
    virtual_time: bool,
}

impl Args {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(v) = self.delay_start_ms {
            settings.delay_start_ms = v;
        }
        if let Some(v) = self.min_loading_time_ms {
            settings.min_loading_time_ms = v;
        }
        if let Some(v) = self.max_loading_time_ms {
            settings.max_loading_time_ms = v;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_overrides(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loading = settings
        .loading_config()
        .context("invalid loading configuration")?;
    let steps = script::load_script(&args.script)?;
    info!(
        steps = steps.len(),
        delay_start_ms = settings.delay_start_ms,
        min_loading_time_ms = settings.min_loading_time_ms,
        max_loading_time_ms = settings.max_loading_time_ms,
        virtual_time = args.virtual_time,
        "replay: starting"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(args.virtual_time)
        .build()
        .context("failed to build replay runtime")?;
    let outcome = runtime.block_on(script::replay(loading, steps))?;

    for record in &outcome.records {
        if args.json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{:>7}ms  {}", record.offset_ms, script::describe(&record.event));
        }
    }
    if !outcome.settled {
        info!("replay: indicator was still busy when the replay ended");
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
