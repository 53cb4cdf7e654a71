use std::time::Duration;

use shared::domain::{CycleId, Phase};
use tokio::time::Instant;

/// One loading cycle. Exists only while the machine is not idle, so `phase`
/// is never [`Phase::Idle`]; `started_at` is set exactly when the phase is
/// `Active` or `Settling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    cycle: CycleId,
    phase: Phase,
    requested_at: Instant,
    started_at: Option<Instant>,
}

impl Session {
    pub fn begin(cycle: CycleId, now: Instant) -> Self {
        Self {
            cycle,
            phase: Phase::Delaying,
            requested_at: now,
            started_at: None,
        }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the trigger that opened this cycle was accepted.
    pub fn requested_at(&self) -> Instant {
        self.requested_at
    }

    /// When the indicator became visible for this cycle.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn is_visible(&self) -> bool {
        self.phase.is_visible_phase()
    }

    /// `Delaying -> Active`. Returns false if the session was not delaying.
    pub fn activate(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Delaying {
            return false;
        }
        self.phase = Phase::Active;
        self.started_at = Some(now);
        true
    }

    /// `Active -> Settling`. Returns false if the session was not active.
    pub fn settle(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.phase = Phase::Settling;
        true
    }

    pub fn visible_elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|started_at| now.saturating_duration_since(started_at))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
