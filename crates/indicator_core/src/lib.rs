//! Bounded-latency busy indicator controller.
//!
//! A [`LoadingStateMachine`] turns "work started" / "work finished" signals into
//! a single `visible` flag: it waits out a start delay before showing anything,
//! keeps the indicator up for a minimum hold once shown, and force-hides it
//! after a maximum hold. A [`TriggerAdapter`] binds host trigger sources and the
//! manual API to one machine instance.

mod adapter;
mod config;
mod machine;
mod session;
mod timers;

pub use adapter::TriggerAdapter;
pub use config::{
    LoadingConfig, DEFAULT_DELAY_START, DEFAULT_MAX_LOADING_TIME, DEFAULT_MIN_LOADING_TIME,
};
pub use machine::{IndicatorSnapshot, LoadingStateMachine};
pub use session::Session;
pub use shared::{
    domain::{CycleId, HideReason, Phase, TimerId, TimerKind},
    error::ConfigError,
    protocol::{HostSignal, IndicatorEvent, ReadyVia},
};
pub use timers::TimerSet;
pub use trigger_integration::{ChannelTriggerSource, TriggerSource};
