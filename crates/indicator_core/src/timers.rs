use std::collections::HashMap;

use shared::domain::{TimerId, TimerKind};
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

struct TimerEntry {
    id: TimerId,
    fire_at: Instant,
    task: JoinHandle<()>,
}

/// Cancelable delayed callbacks, at most one live entry per [`TimerKind`].
///
/// Each entry runs as a task that sleeps until its deadline and then invokes
/// its callback with the entry's id. The callback is expected to [`claim`]
/// the entry before acting: a callback whose entry was canceled or replaced
/// in the meantime claims nothing, which covers tasks that had already woken
/// when the cancellation happened.
///
/// [`claim`]: TimerSet::claim
pub struct TimerSet {
    runtime: Handle,
    next_id: u64,
    live: HashMap<TimerKind, TimerEntry>,
}

impl TimerSet {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: 0,
            live: HashMap::new(),
        }
    }

    /// Schedules `on_fire` for `fire_at`, canceling any live entry of the same kind.
    pub fn schedule<F>(&mut self, kind: TimerKind, fire_at: Instant, on_fire: F) -> TimerId
    where
        F: FnOnce(TimerId) + Send + 'static,
    {
        self.cancel(kind);

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(fire_at).await;
            on_fire(id);
        });
        self.live.insert(kind, TimerEntry { id, fire_at, task });
        id
    }

    /// Retires the live entry of `kind` if it is still the one identified by `id`.
    /// Succeeds at most once per entry.
    pub fn claim(&mut self, kind: TimerKind, id: TimerId) -> bool {
        match self.live.get(&kind) {
            Some(entry) if entry.id == id => {
                self.live.remove(&kind);
                true
            }
            _ => false,
        }
    }

    /// Idempotent; returns whether a live entry was canceled.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.live.remove(&kind) {
            Some(entry) => {
                entry.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let mut canceled = 0;
        for (_, entry) in self.live.drain() {
            entry.task.abort();
            canceled += 1;
        }
        canceled
    }

    pub fn is_live(&self, kind: TimerKind) -> bool {
        self.live.contains_key(&kind)
    }

    pub fn fire_at(&self, kind: TimerKind) -> Option<Instant> {
        self.live.get(&kind).map(|entry| entry.fire_at)
    }

    pub fn live_kinds(&self) -> Vec<TimerKind> {
        TimerKind::ALL
            .into_iter()
            .filter(|kind| self.live.contains_key(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "tests/timers_tests.rs"]
mod tests;
