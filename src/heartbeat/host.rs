//! Process-wide home for the single heartbeat scheduler.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::service::HeartbeatScheduler;
use crate::error::{BeaconError, Result};

static GLOBAL_SLOT: SchedulerSlot = SchedulerSlot::new();

/// Result of [`SchedulerSlot::ensure_exists`].
pub enum EnsureOutcome {
    /// This call built and started the scheduler.
    Created(Arc<HeartbeatScheduler>),
    /// A scheduler already existed; the new one was discarded.
    Existing(Arc<HeartbeatScheduler>),
}

impl EnsureOutcome {
    pub fn scheduler(&self) -> &Arc<HeartbeatScheduler> {
        match self {
            Self::Created(scheduler) | Self::Existing(scheduler) => scheduler,
        }
    }

    pub fn into_scheduler(self) -> Arc<HeartbeatScheduler> {
        match self {
            Self::Created(scheduler) | Self::Existing(scheduler) => scheduler,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Holds at most one started [`HeartbeatScheduler`].
///
/// The slot is filled exactly once; it is never emptied, so a destroyed
/// scheduler stays terminal instead of being replaced.
pub struct SchedulerSlot {
    cell: OnceCell<Arc<HeartbeatScheduler>>,
}

impl SchedulerSlot {
    /// An empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The slot hosts should call from their startup hook.
    pub fn global() -> &'static SchedulerSlot {
        &GLOBAL_SLOT
    }

    /// The scheduler, if one was created.
    pub fn get(&self) -> Option<&Arc<HeartbeatScheduler>> {
        self.cell.get()
    }

    /// Build and start a scheduler unless the slot is already filled.
    ///
    /// `init` runs at most once across all callers. If building or starting
    /// fails, the slot stays empty and the error is returned.
    pub fn ensure_exists<F>(&self, init: F) -> Result<EnsureOutcome>
    where
        F: FnOnce() -> Result<HeartbeatScheduler>,
    {
        let mut created = false;
        let scheduler = self.cell.get_or_try_init(|| {
            let scheduler = Arc::new(init()?);
            scheduler.start()?;
            created = true;
            Ok::<_, BeaconError>(scheduler)
        })?;

        if created {
            Ok(EnsureOutcome::Created(Arc::clone(scheduler)))
        } else {
            debug!("Heartbeat scheduler already exists, discarding duplicate");
            Ok(EnsureOutcome::Existing(Arc::clone(scheduler)))
        }
    }

    /// Place an already-built scheduler in the slot. A duplicate is dropped
    /// without ever being started.
    pub fn install(&self, scheduler: HeartbeatScheduler) -> Result<EnsureOutcome> {
        self.ensure_exists(move || Ok(scheduler))
    }
}

impl Default for SchedulerSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeartbeatConfig;
    use crate::heartbeat::service::SchedulerState;
    use crate::heartbeat::test_support::MockTransport;
    use crate::identity::{IdentityProvider, MemoryStore};
    use crate::lifecycle::HostEvents;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scheduler(transport: &Arc<MockTransport>, events: &Arc<HostEvents>) -> HeartbeatScheduler {
        let config = HeartbeatConfig::default();
        let identity = IdentityProvider::new(Arc::new(MemoryStore::new()), "key", "dev");
        HeartbeatScheduler::new(&config, identity, transport.clone(), events.clone()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_exists_creates_once() {
        let slot = SchedulerSlot::new();
        let transport = Arc::new(MockTransport::ok());
        let events = Arc::new(HostEvents::new());
        let builds = AtomicUsize::new(0);

        let first = slot
            .ensure_exists(|| {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(scheduler(&transport, &events))
            })
            .unwrap();
        assert!(first.is_created());
        assert_eq!(first.scheduler().state(), SchedulerState::Active);

        let second = slot
            .ensure_exists(|| {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(scheduler(&transport, &events))
            })
            .unwrap();
        assert!(!second.is_created());
        assert!(Arc::ptr_eq(first.scheduler(), second.scheduler()));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(events.listener_count(), 1);

        first.scheduler().destroy();
    }

    #[tokio::test(start_paused = true)]
    async fn test_install_discards_duplicate() {
        let slot = SchedulerSlot::new();
        let transport = Arc::new(MockTransport::ok());
        let events = Arc::new(HostEvents::new());

        let original = slot
            .install(scheduler(&transport, &events))
            .unwrap()
            .into_scheduler();
        let outcome = slot.install(scheduler(&transport, &events)).unwrap();

        assert!(!outcome.is_created());
        assert!(Arc::ptr_eq(&original, outcome.scheduler()));
        assert!(Arc::ptr_eq(&original, slot.get().unwrap()));
        // Only the original subscribed to the host.
        assert_eq!(events.listener_count(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(transport.calls(), 1);
        original.destroy();
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let slot = SchedulerSlot::new();
        let result = slot.ensure_exists(|| Err(BeaconError::Config("bad".to_string())));
        assert!(result.is_err());
        assert!(slot.get().is_none());

        let transport = Arc::new(MockTransport::ok());
        let events = Arc::new(HostEvents::new());
        let outcome = slot
            .ensure_exists(|| Ok(scheduler(&transport, &events)))
            .unwrap();
        assert!(outcome.is_created());
        outcome.scheduler().destroy();
    }

    #[test]
    fn test_start_failure_leaves_slot_empty() {
        let slot = SchedulerSlot::new();
        let transport = Arc::new(MockTransport::ok());
        let events = Arc::new(HostEvents::new());

        let err = slot
            .ensure_exists(|| Ok(scheduler(&transport, &events)))
            .err()
            .unwrap();
        assert!(matches!(err, BeaconError::Runtime(_)));
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_global_slot_is_shared() {
        assert!(std::ptr::eq(SchedulerSlot::global(), SchedulerSlot::global()));
    }
}
