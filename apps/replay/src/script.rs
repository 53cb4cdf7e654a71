//! Replay scripts: JSON lines of timed host signals and manual triggers.

use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use indicator_core::{LoadingConfig, LoadingStateMachine, Phase, TriggerAdapter};
use serde::Serialize;
use shared::protocol::{IndicatorEvent, ReplayAction, ReplayStep};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    time::{sleep_until, timeout, Instant},
};
use tracing::{debug, warn};
use trigger_integration::ChannelTriggerSource;

const SCRIPT_SOURCE_NAME: &str = "script";
const IDLE_WAIT_SLACK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub offset_ms: u64,
    pub event: IndicatorEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub records: Vec<ReplayRecord>,
    /// Whether the run reached idle before the final dispose.
    pub settled: bool,
}

pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script '{}'", path.display()))?;
    parse_script(&raw).with_context(|| format!("invalid replay script '{}'", path.display()))
}

/// Blank lines and lines starting with `#` are skipped. Steps are ordered by
/// `at_ms`, keeping file order for equal offsets.
pub fn parse_script(raw: &str) -> Result<Vec<ReplayStep>> {
    let mut steps = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: ReplayStep = serde_json::from_str(line)
            .with_context(|| format!("line {}: malformed step", index + 1))?;
        steps.push(step);
    }
    steps.sort_by_key(|step| step.at_ms);
    Ok(steps)
}

pub async fn replay(config: LoadingConfig, steps: Vec<ReplayStep>) -> Result<ReplayOutcome> {
    let machine = LoadingStateMachine::new(config);
    let adapter = TriggerAdapter::new(Arc::clone(&machine));
    let source = Arc::new(ChannelTriggerSource::new(SCRIPT_SOURCE_NAME));
    adapter.bind(source.clone());

    let origin = Instant::now();
    let collector = tokio::spawn(collect_events(machine.subscribe_events(), origin));

    for step in steps {
        sleep_until(origin + Duration::from_millis(step.at_ms)).await;
        debug!(at_ms = step.at_ms, action = ?step.action, "replay: applying step");
        apply(&adapter, &source, step.action);
        // Give the listener a turn so signal order matches script order.
        tokio::task::yield_now().await;
    }

    let bound = config.delay_start() + config.max_loading_time() + IDLE_WAIT_SLACK;
    let settled = wait_for_idle(&machine, bound).await;
    if !settled {
        warn!(bound_ms = bound.as_millis() as u64, "replay: machine still busy at end of replay");
    }
    adapter.dispose();

    let records = collector.await.context("event collector task failed")?;
    Ok(ReplayOutcome { records, settled })
}

fn apply(adapter: &TriggerAdapter, source: &ChannelTriggerSource, action: ReplayAction) {
    match action {
        ReplayAction::Navigate { route } => {
            source.navigate(route);
        }
        ReplayAction::Ready { via } => {
            source.page_ready(via);
        }
        ReplayAction::ManualStart => {
            adapter.start_loading();
        }
        ReplayAction::ManualComplete => adapter.complete_loading(),
        ReplayAction::Dispose => adapter.dispose(),
    }
}

async fn collect_events(
    mut events: broadcast::Receiver<IndicatorEvent>,
    origin: Instant,
) -> Vec<ReplayRecord> {
    let mut records = Vec::new();
    loop {
        match events.recv().await {
            Ok(event) => {
                let done = event == IndicatorEvent::Disposed;
                records.push(ReplayRecord {
                    offset_ms: origin.elapsed().as_millis() as u64,
                    event,
                });
                if done {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "replay: event collector lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    records
}

async fn wait_for_idle(machine: &LoadingStateMachine, bound: Duration) -> bool {
    let mut events = machine.subscribe_events();
    timeout(bound, async {
        loop {
            if machine.phase() == Phase::Idle {
                return;
            }
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    })
    .await
    .is_ok()
}

pub fn describe(event: &IndicatorEvent) -> String {
    match event {
        IndicatorEvent::CycleStarted { cycle } => format!("cycle {cycle} started"),
        IndicatorEvent::Shown { cycle } => format!("cycle {cycle} shown"),
        IndicatorEvent::Settling {
            cycle,
            remaining_ms,
        } => format!("cycle {cycle} settling, {remaining_ms}ms of minimum hold left"),
        IndicatorEvent::CompletedBeforeShown { cycle } => {
            format!("cycle {cycle} completed before the indicator appeared")
        }
        IndicatorEvent::Hidden { cycle, reason } => format!("cycle {cycle} hidden ({reason:?})"),
        IndicatorEvent::Disposed => "disposed".to_string(),
    }
}

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
