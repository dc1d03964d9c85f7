//! Host application lifecycle signals.
//!
//! The embedding application owns startup and shutdown. Startup is an explicit
//! call to `SchedulerSlot::ensure_exists`; shutdown arrives through the
//! [`HostLifecycle`] "quitting" event, which the scheduler subscribes to once
//! per lifetime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::utils::lock;

/// Callback invoked when the host is quitting.
pub type QuitListener = Arc<dyn Fn() + Send + Sync>;

/// Handle for removing a quitting listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event source for the host's "application quitting" signal.
pub trait HostLifecycle: Send + Sync {
    /// Register `listener` to run when the host quits.
    fn on_quitting(&self, listener: QuitListener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// In-process [`HostLifecycle`] the host drives with [`HostEvents::emit_quitting`].
#[derive(Default)]
pub struct HostEvents {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, QuitListener)>>,
    quitting: AtomicBool,
}

impl HostEvents {
    /// Create an event source with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the quitting event. Returns the number of listeners notified.
    ///
    /// Listeners run outside the registry lock, so they may unsubscribe
    /// themselves. Listeners registered afterwards run immediately.
    pub fn emit_quitting(&self) -> usize {
        let listeners: Vec<QuitListener> = {
            let registered = lock(&self.listeners);
            self.quitting.store(true, Ordering::SeqCst);
            registered
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        debug!("Host quitting, notifying {} listener(s)", listeners.len());
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    /// Whether `emit_quitting` has been called.
    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

impl HostLifecycle for HostEvents {
    fn on_quitting(&self, listener: QuitListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        // The flag flips under the same lock, so a listener is either in the
        // snapshot `emit_quitting` takes or sees the flag here. Never both.
        let already_quitting = {
            let mut listeners = lock(&self.listeners);
            listeners.push((id, Arc::clone(&listener)));
            self.quitting.load(Ordering::SeqCst)
        };
        if already_quitting {
            debug!("Host already quitting, notifying late listener");
            listener();
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}
