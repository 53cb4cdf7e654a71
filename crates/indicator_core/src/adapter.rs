use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::CycleId,
    protocol::{HostSignal, ReadyVia},
};
use tokio::{runtime::Handle, sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info, warn};
use trigger_integration::TriggerSource;

use crate::machine::LoadingStateMachine;

struct Binding {
    source: String,
    task: JoinHandle<()>,
}

/// Maps host signals onto the machine. Shared by the adapter and every
/// listener task.
struct SignalRouter {
    machine: Arc<LoadingStateMachine>,
    last_route: Mutex<Option<String>>,
}

impl SignalRouter {
    async fn handle(&self, source: &dyn TriggerSource, signal: HostSignal) {
        match signal {
            HostSignal::NavigationChanged { route } => self.navigate(source, route).await,
            HostSignal::PageReady { via } => self.ready(source.name(), via),
        }
    }

    async fn navigate(&self, source: &dyn TriggerSource, route: String) {
        {
            let mut last_route = self.last_route.lock().unwrap_or_else(PoisonError::into_inner);
            if last_route.as_deref() == Some(route.as_str()) {
                debug!(source = source.name(), %route, "indicator: navigation to current route ignored");
                return;
            }
            *last_route = Some(route.clone());
        }

        let Some(cycle) = self.machine.start() else {
            return;
        };
        debug!(source = source.name(), %route, %cycle, "indicator: navigation started cycle");

        if source.is_ready().await {
            debug!(source = source.name(), %cycle, "indicator: page already ready");
            self.machine.complete_cycle(cycle);
        }
    }

    fn ready(&self, source: &str, via: ReadyVia) {
        debug!(source, ?via, "indicator: page ready");
        self.machine.complete();
    }
}

/// Binds trigger sources and the manual API to a single [`LoadingStateMachine`].
///
/// Listener bindings only change through [`bind`](Self::bind),
/// [`rebind`](Self::rebind) and [`detach_all`](Self::detach_all); phase changes
/// inside the machine never touch them. Dropping the adapter detaches every
/// listener and disposes the machine.
pub struct TriggerAdapter {
    router: Arc<SignalRouter>,
    runtime: Handle,
    bindings: Mutex<Vec<Binding>>,
}

impl TriggerAdapter {
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(machine: Arc<LoadingStateMachine>) -> Self {
        Self::with_runtime(machine, Handle::current())
    }

    pub fn with_runtime(machine: Arc<LoadingStateMachine>, runtime: Handle) -> Self {
        Self {
            router: Arc::new(SignalRouter {
                machine,
                last_route: Mutex::new(None),
            }),
            runtime,
            bindings: Mutex::new(Vec::new()),
        }
    }

    pub fn machine(&self) -> &Arc<LoadingStateMachine> {
        &self.router.machine
    }

    /// Starts listening to `source`. A source already bound under the same
    /// name is replaced.
    pub fn bind(&self, source: Arc<dyn TriggerSource>) {
        let name = source.name().to_string();
        // Subscribe before spawning so signals emitted right after `bind` are seen.
        let mut signals = source.subscribe();
        let router = Arc::clone(&self.router);
        let task = self.runtime.spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => router.handle(source.as_ref(), signal).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(source = source.name(), skipped, "indicator: trigger listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!(source = source.name(), "indicator: trigger source closed");
                        break;
                    }
                }
            }
        });

        let mut bindings = self.bindings();
        if let Some(index) = bindings.iter().position(|binding| binding.source == name) {
            let previous = bindings.swap_remove(index);
            previous.task.abort();
            debug!(source = %name, "indicator: replaced existing binding");
        }
        info!(source = %name, "indicator: trigger source bound");
        bindings.push(Binding { source: name, task });
    }

    /// Detaches every current listener, then binds `sources`.
    pub fn rebind<I>(&self, sources: I)
    where
        I: IntoIterator<Item = Arc<dyn TriggerSource>>,
    {
        self.detach_all();
        for source in sources {
            self.bind(source);
        }
    }

    /// Returns the number of listeners that were detached.
    pub fn detach_all(&self) -> usize {
        let detached: Vec<Binding> = self.bindings().drain(..).collect();
        for binding in &detached {
            binding.task.abort();
            debug!(source = %binding.source, "indicator: trigger source detached");
        }
        detached.len()
    }

    pub fn bound_sources(&self) -> Vec<String> {
        self.bindings()
            .iter()
            .map(|binding| binding.source.clone())
            .collect()
    }

    pub fn start_loading(&self) -> Option<CycleId> {
        debug!("indicator: manual start");
        self.router.machine.start()
    }

    pub fn complete_loading(&self) {
        debug!("indicator: manual complete");
        self.router.machine.complete();
    }

    /// Feeds a signal as if it had arrived from `source`.
    pub async fn handle_signal(&self, source: &dyn TriggerSource, signal: HostSignal) {
        self.router.handle(source, signal).await;
    }

    /// Detaches every listener and disposes the machine. Idempotent.
    pub fn dispose(&self) {
        self.detach_all();
        self.router.machine.dispose();
    }

    fn bindings(&self) -> MutexGuard<'_, Vec<Binding>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TriggerAdapter {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
