use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{CycleId, HideReason, Phase, TimerId, TimerKind},
    protocol::IndicatorEvent,
};
use tokio::{
    runtime::Handle,
    sync::{broadcast, watch},
    time::Instant,
};
use tracing::{debug, info};

use crate::{
    config::{duration_ms, LoadingConfig},
    session::Session,
    timers::TimerSet,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSnapshot {
    pub phase: Phase,
    pub visible: bool,
    pub cycle: Option<CycleId>,
    pub disposed: bool,
}

struct MachineState {
    session: Option<Session>,
    timers: TimerSet,
    last_cycle: u64,
    disposed: bool,
}

/// Decides when the busy indicator is visible.
///
/// `start()` opens a cycle that stays hidden for `delay_start`; once shown the
/// indicator stays up for at least `min_loading_time` and at most
/// `max_loading_time`. A new `start()` always supersedes the running cycle.
/// All entry points are total: calls that make no sense in the current phase
/// are ignored.
///
/// The machine spawns its timers on the Tokio runtime it was created on. Timer
/// tasks only hold a weak reference, so dropping the last `Arc` cancels them.
pub struct LoadingStateMachine {
    config: LoadingConfig,
    state: Mutex<MachineState>,
    visible: watch::Sender<bool>,
    events: broadcast::Sender<IndicatorEvent>,
}

impl LoadingStateMachine {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(config: LoadingConfig) -> Arc<Self> {
        Self::with_runtime(config, Handle::current())
    }

    pub fn with_runtime(config: LoadingConfig, runtime: Handle) -> Arc<Self> {
        let (visible, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            config,
            state: Mutex::new(MachineState {
                session: None,
                timers: TimerSet::new(runtime),
                last_cycle: 0,
                disposed: false,
            }),
            visible,
            events,
        })
    }

    pub fn config(&self) -> &LoadingConfig {
        &self.config
    }

    /// Opens a new cycle, superseding whatever cycle was running. Returns the
    /// new cycle id, or `None` once the machine has been disposed.
    pub fn start(self: &Arc<Self>) -> Option<CycleId> {
        let mut state = self.lock();
        if state.disposed {
            debug!("indicator: start ignored after dispose");
            return None;
        }

        let canceled = state.timers.cancel_all();
        if let Some(previous) = state.session.take() {
            debug!(
                cycle = %previous.cycle(),
                phase = ?previous.phase(),
                canceled_timers = canceled,
                "indicator: superseding cycle"
            );
            if previous.is_visible() {
                self.hide(previous.cycle(), HideReason::Superseded);
            }
        }

        state.last_cycle += 1;
        let cycle = CycleId(state.last_cycle);
        let now = Instant::now();
        state.session = Some(Session::begin(cycle, now));
        self.emit(IndicatorEvent::CycleStarted { cycle });

        if self.config.delay_start().is_zero() {
            self.activate(&mut state, now);
        } else {
            self.schedule(&mut state, TimerKind::Delay, now + self.config.delay_start());
        }
        Some(cycle)
    }

    /// Signals that the work behind the current cycle finished.
    pub fn complete(self: &Arc<Self>) {
        let mut state = self.lock();
        self.complete_locked(&mut state, None);
    }

    /// Like [`complete`](Self::complete), but only if `cycle` is still the
    /// running cycle.
    pub fn complete_cycle(self: &Arc<Self>, cycle: CycleId) {
        let mut state = self.lock();
        self.complete_locked(&mut state, Some(cycle));
    }

    /// Cancels every timer and forces the machine idle for good. The visible
    /// flag is left as it was.
    pub fn dispose(&self) {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        let canceled = state.timers.cancel_all();
        let previous = state.session.take();
        info!(
            cycle = previous.map(|session| session.cycle().0),
            canceled_timers = canceled,
            "indicator: disposed"
        );
        self.emit(IndicatorEvent::Disposed);
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.lock()
            .session
            .map_or(Phase::Idle, |session| session.phase())
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        let state = self.lock();
        IndicatorSnapshot {
            phase: state.session.map_or(Phase::Idle, |session| session.phase()),
            visible: self.is_visible(),
            cycle: state.session.map(|session| session.cycle()),
            disposed: state.disposed,
        }
    }

    pub fn live_timers(&self) -> Vec<TimerKind> {
        self.lock().timers.live_kinds()
    }

    pub fn subscribe_visibility(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<IndicatorEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete_locked(self: &Arc<Self>, state: &mut MachineState, expected: Option<CycleId>) {
        if state.disposed {
            debug!("indicator: complete ignored after dispose");
            return;
        }
        let Some(session) = state.session else {
            debug!("indicator: complete ignored while idle");
            return;
        };
        if expected.is_some_and(|cycle| cycle != session.cycle()) {
            debug!(
                cycle = %session.cycle(),
                expected = ?expected,
                "indicator: complete ignored for superseded cycle"
            );
            return;
        }

        match session.phase() {
            Phase::Delaying => {
                state.timers.cancel(TimerKind::Delay);
                state.session = None;
                debug!(cycle = %session.cycle(), "indicator: completed before shown");
                self.emit(IndicatorEvent::CompletedBeforeShown {
                    cycle: session.cycle(),
                });
            }
            Phase::Active => {
                let now = Instant::now();
                let elapsed = session.visible_elapsed(now).unwrap_or_default();
                let min_loading_time = self.config.min_loading_time();
                if elapsed >= min_loading_time {
                    self.finish(state, HideReason::Completed);
                    return;
                }

                let remaining = min_loading_time - elapsed;
                if let Some(session) = state.session.as_mut() {
                    session.settle();
                }
                self.schedule(state, TimerKind::MinHold, now + remaining);
                debug!(
                    cycle = %session.cycle(),
                    remaining_ms = duration_ms(remaining),
                    "indicator: settling"
                );
                self.emit(IndicatorEvent::Settling {
                    cycle: session.cycle(),
                    remaining_ms: duration_ms(remaining),
                });
            }
            Phase::Settling => {
                debug!(cycle = %session.cycle(), "indicator: completion already pending");
            }
            Phase::Idle => {}
        }
    }

    fn on_timer(self: &Arc<Self>, kind: TimerKind, id: TimerId) {
        let mut state = self.lock();
        if !state.timers.claim(kind, id) {
            debug!(kind = kind.as_str(), timer = %id, "indicator: stale timer ignored");
            return;
        }
        let Some(session) = state.session else {
            return;
        };

        match (kind, session.phase()) {
            (TimerKind::Delay, Phase::Delaying) => self.activate(&mut state, Instant::now()),
            (TimerKind::MaxHold, Phase::Active | Phase::Settling) => {
                self.finish(&mut state, HideReason::MaxHoldExpired)
            }
            (TimerKind::MinHold, Phase::Settling) => {
                self.finish(&mut state, HideReason::MinHoldElapsed)
            }
            (kind, phase) => debug!(
                kind = kind.as_str(),
                ?phase,
                "indicator: timer fired in unexpected phase"
            ),
        }
    }

    fn activate(self: &Arc<Self>, state: &mut MachineState, now: Instant) {
        let Some(session) = state.session.as_mut() else {
            return;
        };
        if !session.activate(now) {
            return;
        }
        let cycle = session.cycle();

        self.schedule(state, TimerKind::MaxHold, now + self.config.max_loading_time());
        self.set_visible(true);
        info!(cycle = %cycle, "indicator: shown");
        self.emit(IndicatorEvent::Shown { cycle });
    }

    fn finish(&self, state: &mut MachineState, reason: HideReason) {
        state.timers.cancel_all();
        if let Some(session) = state.session.take() {
            self.hide(session.cycle(), reason);
        }
    }

    fn hide(&self, cycle: CycleId, reason: HideReason) {
        self.set_visible(false);
        info!(cycle = %cycle, ?reason, "indicator: hidden");
        self.emit(IndicatorEvent::Hidden { cycle, reason });
    }

    fn schedule(self: &Arc<Self>, state: &mut MachineState, kind: TimerKind, fire_at: Instant) {
        let machine = Arc::downgrade(self);
        let id = state.timers.schedule(kind, fire_at, move |id| {
            if let Some(machine) = machine.upgrade() {
                machine.on_timer(kind, id);
            }
        });
        debug!(kind = kind.as_str(), timer = %id, "indicator: timer scheduled");
    }

    fn set_visible(&self, visible: bool) {
        self.visible.send_if_modified(|current| {
            if *current == visible {
                return false;
            }
            *current = visible;
            true
        });
    }

    fn emit(&self, event: IndicatorEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/machine_tests.rs"]
mod tests;
