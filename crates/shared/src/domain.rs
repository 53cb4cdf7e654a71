use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CycleId);
id_newtype!(TimerId);

/// Where a loading cycle currently stands. `Idle` means there is no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Delaying,
    Active,
    Settling,
}

impl Phase {
    pub fn is_visible_phase(self) -> bool {
        matches!(self, Phase::Active | Phase::Settling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Delay,
    MinHold,
    MaxHold,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::Delay, TimerKind::MinHold, TimerKind::MaxHold];

    pub fn as_str(self) -> &'static str {
        match self {
            TimerKind::Delay => "delay",
            TimerKind::MinHold => "min_hold",
            TimerKind::MaxHold => "max_hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideReason {
    Completed,
    MinHoldElapsed,
    MaxHoldExpired,
    Superseded,
}
