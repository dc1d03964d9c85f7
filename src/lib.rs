//! presence-beacon - embeddable installation heartbeat client
//!
//! A host application calls [`SchedulerSlot::ensure_exists`] at startup. The
//! scheduler resolves a persisted installation identity, posts a heartbeat to
//! the collection service every 30 seconds, and stops when the host emits its
//! quitting signal. Heartbeat failures are logged and never reach the host.
//!
//! ```no_run
//! use std::sync::Arc;
//! use presence_beacon::{
//!     HeartbeatConfig, HeartbeatScheduler, HostEvents, MemoryStore, SchedulerSlot,
//! };
//!
//! # tokio_test::block_on(async {
//! let events = Arc::new(HostEvents::new());
//! let config = HeartbeatConfig::default();
//! let outcome = SchedulerSlot::global().ensure_exists(|| {
//!     HeartbeatScheduler::from_config(
//!         &config,
//!         Arc::new(MemoryStore::new()),
//!         "my-device",
//!         events.clone(),
//!     )
//! })?;
//! assert!(outcome.is_created());
//!
//! // On shutdown:
//! events.emit_quitting();
//! # Ok::<(), presence_beacon::BeaconError>(())
//! # });
//! ```

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod identity;
pub mod lifecycle;
mod utils;

pub use config::HeartbeatConfig;
pub use error::{BeaconError, Result};
pub use heartbeat::{EnsureOutcome, HeartbeatScheduler, SchedulerSlot, SendOutcome};
pub use identity::{IdentityProvider, JsonFileStore, KeyValueStore, MemoryStore};
pub use lifecycle::{HostEvents, HostLifecycle};
