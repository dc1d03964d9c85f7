//! Heartbeat scheduler implementation.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::sender::{HeartbeatSender, SendOutcome};
use super::transport::{HeartbeatRequest, HeartbeatTransport, ReqwestTransport};
use crate::config::HeartbeatConfig;
use crate::error::{BeaconError, Result};
use crate::identity::{IdentityProvider, KeyValueStore};
use crate::lifecycle::{HostLifecycle, ListenerId};
use crate::utils::lock;

const IDLE: u8 = 0;
const ACTIVE: u8 = 1;
const TERMINATED: u8 = 2;

/// Lifecycle of a [`HeartbeatScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, timer not armed yet.
    Idle,
    /// Timer armed and ticking.
    Active,
    /// Timer disposed. Terminal.
    Terminated,
}

/// Cancels the ticker task when disposed.
struct TimerHandle {
    cancel: watch::Sender<bool>,
}

impl TimerHandle {
    fn dispose(self) {
        // A closed channel means the ticker is already gone.
        let _ = self.cancel.send(true);
    }
}

/// Background scheduler that posts a heartbeat every `interval`.
///
/// One scheduler is meant to exist per process. Hosts obtain it through
/// [`SchedulerSlot::ensure_exists`](super::SchedulerSlot::ensure_exists),
/// which refuses to build a second one; constructing a scheduler directly is
/// for tests and custom slots.
///
/// Each tick spawns a fire-and-forget send. At most one send is in flight;
/// ticks that land while one is outstanding are dropped, so the effective
/// cadence can be slower than `interval` but never faster.
pub struct HeartbeatScheduler {
    interval: Duration,
    modpack: String,
    identity: IdentityProvider,
    transport: Arc<dyn HeartbeatTransport>,
    lifecycle: Arc<dyn HostLifecycle>,
    sender: OnceCell<Arc<HeartbeatSender>>,
    state: AtomicU8,
    timer: Mutex<Option<TimerHandle>>,
    quit_listener: Mutex<Option<ListenerId>>,
}

impl HeartbeatScheduler {
    /// Create an idle scheduler.
    pub fn new(
        config: &HeartbeatConfig,
        identity: IdentityProvider,
        transport: Arc<dyn HeartbeatTransport>,
        lifecycle: Arc<dyn HostLifecycle>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            interval: config.interval(),
            modpack: config.modpack.clone(),
            identity,
            transport,
            lifecycle,
            sender: OnceCell::new(),
            state: AtomicU8::new(IDLE),
            timer: Mutex::new(None),
            quit_listener: Mutex::new(None),
        })
    }

    /// Create an idle scheduler posting over HTTP with an identity kept in
    /// `store` under `config.identity_key`.
    pub fn from_config(
        config: &HeartbeatConfig,
        store: Arc<dyn KeyValueStore>,
        device: &str,
        lifecycle: Arc<dyn HostLifecycle>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        let identity = IdentityProvider::new(store, &config.identity_key, device);
        Self::new(config, identity, transport, lifecycle)
    }

    /// Arm the timer (first tick immediately) and subscribe to the host's
    /// quitting signal.
    ///
    /// No-op when already active or terminated. Fails only when called
    /// outside a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| {
            BeaconError::Runtime(format!("Heartbeat scheduler needs a tokio runtime: {}", e))
        })?;

        {
            let mut timer = lock(&self.timer);
            if let Err(current) =
                self.state
                    .compare_exchange(IDLE, ACTIVE, Ordering::SeqCst, Ordering::SeqCst)
            {
                debug!(
                    "Heartbeat scheduler not idle ({:?}), ignoring start",
                    decode_state(current)
                );
                return Ok(());
            }

            let sender = Arc::clone(self.sender());
            let (cancel, cancel_rx) = watch::channel(false);
            runtime.spawn(run_ticker(self.interval, sender, cancel_rx));
            *timer = Some(TimerHandle { cancel });
        }

        // No scheduler lock may be held here: a host that is already quitting
        // can run the listener before `on_quitting` returns.
        let weak = Arc::downgrade(self);
        let listener_id = self.lifecycle.on_quitting(Arc::new(move || {
            if let Some(scheduler) = weak.upgrade() {
                info!("Host quitting, disposing heartbeat timer");
                scheduler.dispose_timer();
            }
        }));

        let stale = {
            let mut quit_listener = lock(&self.quit_listener);
            if self.state.load(Ordering::SeqCst) == TERMINATED {
                // Disposed while subscribing; `destroy` may already have run.
                true
            } else {
                *quit_listener = Some(listener_id);
                false
            }
        };
        if stale {
            self.lifecycle.remove_listener(listener_id);
            debug!("Heartbeat scheduler terminated during start");
            return Ok(());
        }

        info!(
            "Heartbeat scheduler started (interval={}ms)",
            self.interval.as_millis()
        );
        Ok(())
    }

    /// Send one heartbeat now, subject to the same overlap guard as ticks.
    ///
    /// Skipped once the scheduler is terminated.
    pub async fn trigger_now(&self) -> SendOutcome {
        if self.state.load(Ordering::SeqCst) == TERMINATED {
            debug!("Heartbeat scheduler terminated, skipping manual send");
            return SendOutcome::Skipped;
        }
        self.sender().attempt_send().await
    }

    /// Stop future ticks. An in-flight send is left to finish.
    ///
    /// Idempotent; moves the scheduler to `Terminated`.
    pub fn dispose_timer(&self) {
        let handle = {
            let mut timer = lock(&self.timer);
            self.state.store(TERMINATED, Ordering::SeqCst);
            timer.take()
        };
        if let Some(handle) = handle {
            handle.dispose();
            debug!("Heartbeat timer disposed");
        }
    }

    /// Dispose the timer and unsubscribe from the host. Safe to call more
    /// than once, and on a scheduler that was never started.
    pub fn destroy(&self) {
        let had_timer = lock(&self.timer).is_some();
        if had_timer {
            info!("Heartbeat host destroyed, disposing timer");
        }
        self.dispose_timer();

        if let Some(id) = lock(&self.quit_listener).take() {
            self.lifecycle.remove_listener(id);
        }
    }

    pub fn state(&self) -> SchedulerState {
        decode_state(self.state.load(Ordering::SeqCst))
    }

    /// The installation identity, once the first send or `start` resolved it.
    pub fn identity(&self) -> Option<&str> {
        self.sender
            .get()
            .map(|sender| sender.request().player_id.as_str())
    }

    /// Whether a heartbeat is currently in flight.
    pub fn is_sending(&self) -> bool {
        self.sender.get().is_some_and(|sender| sender.is_sending())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn sender(&self) -> &Arc<HeartbeatSender> {
        self.sender.get_or_init(|| {
            let player_id = self.identity.get_or_create();
            debug!("Player ID: {}", player_id);
            Arc::new(HeartbeatSender::new(
                Arc::clone(&self.transport),
                HeartbeatRequest::new(&player_id, &self.modpack),
            ))
        })
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.destroy();
    }
}

async fn run_ticker(
    period: Duration,
    sender: Arc<HeartbeatSender>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let sender = Arc::clone(&sender);
                tokio::spawn(async move {
                    sender.attempt_send().await;
                });
            }
        }
    }

    debug!("Heartbeat ticker stopped");
}

fn decode_state(raw: u8) -> SchedulerState {
    match raw {
        IDLE => SchedulerState::Idle,
        ACTIVE => SchedulerState::Active,
        _ => SchedulerState::Terminated,
    }
}
