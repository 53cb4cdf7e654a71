use serde::{Deserialize, Serialize};

use crate::domain::{CycleId, HideReason};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadyVia {
    #[default]
    LoadEvent,
    ReadyStateCheck,
}

/// Signal delivered by a hosting environment to the trigger adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HostSignal {
    NavigationChanged {
        route: String,
    },
    PageReady {
        #[serde(default)]
        via: ReadyVia,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum IndicatorEvent {
    CycleStarted {
        cycle: CycleId,
    },
    Shown {
        cycle: CycleId,
    },
    Settling {
        cycle: CycleId,
        remaining_ms: u64,
    },
    CompletedBeforeShown {
        cycle: CycleId,
    },
    Hidden {
        cycle: CycleId,
        reason: HideReason,
    },
    Disposed,
}

impl IndicatorEvent {
    pub fn cycle(&self) -> Option<CycleId> {
        match self {
            IndicatorEvent::CycleStarted { cycle }
            | IndicatorEvent::Shown { cycle }
            | IndicatorEvent::Settling { cycle, .. }
            | IndicatorEvent::CompletedBeforeShown { cycle }
            | IndicatorEvent::Hidden { cycle, .. } => Some(*cycle),
            IndicatorEvent::Disposed => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ReplayAction {
    Navigate {
        route: String,
    },
    Ready {
        #[serde(default)]
        via: ReadyVia,
    },
    ManualStart,
    ManualComplete,
    Dispose,
}

/// One line of a replay script: an action and its offset from replay start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayStep {
    pub at_ms: u64,
    pub action: ReplayAction,
}
