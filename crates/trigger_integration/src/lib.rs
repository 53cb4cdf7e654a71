//! Host-facing trigger sources. A source announces navigation and page-ready
//! signals over a broadcast channel and answers a readiness probe.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shared::protocol::{HostSignal, ReadyVia};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_SIGNAL_CAPACITY: usize = 64;

#[async_trait]
pub trait TriggerSource: Send + Sync {
    fn name(&self) -> &str;
    fn subscribe(&self) -> broadcast::Receiver<HostSignal>;
    /// Whether the page behind the most recent navigation has already finished
    /// loading. Probed right after a navigation starts a cycle.
    async fn is_ready(&self) -> bool {
        false
    }
}

/// In-process source backed by a broadcast channel.
pub struct ChannelTriggerSource {
    name: String,
    signals: broadcast::Sender<HostSignal>,
    ready: AtomicBool,
}

impl ChannelTriggerSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_SIGNAL_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let (signals, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            signals,
            ready: AtomicBool::new(false),
        }
    }

    /// Returns the number of listeners that received the signal.
    pub fn emit(&self, signal: HostSignal) -> usize {
        match self.signals.send(signal) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(signal)) => {
                debug!(source = %self.name, ?signal, "trigger: no listeners bound");
                0
            }
        }
    }

    pub fn navigate(&self, route: impl Into<String>) -> usize {
        self.ready.store(false, Ordering::SeqCst);
        self.emit(HostSignal::NavigationChanged {
            route: route.into(),
        })
    }

    pub fn page_ready(&self, via: ReadyVia) -> usize {
        self.ready.store(true, Ordering::SeqCst);
        self.emit(HostSignal::PageReady { via })
    }

    /// Sets the readiness probe answer without emitting a signal.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.signals.receiver_count()
    }
}

#[async_trait]
impl TriggerSource for ChannelTriggerSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.signals.subscribe()
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
