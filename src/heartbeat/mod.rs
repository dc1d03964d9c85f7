//! Heartbeat client - periodic presence reports to the collection service.

mod guard;
mod host;
mod sender;
mod service;
mod transport;

#[cfg(test)]
mod test_support;

pub use guard::{SendGuard, SendPermit};
pub use host::{EnsureOutcome, SchedulerSlot};
pub use sender::{HeartbeatSender, SendOutcome};
pub use service::{HeartbeatScheduler, SchedulerState};
pub use transport::{
    HeartbeatPayload, HeartbeatRequest, HeartbeatTransport, ReqwestTransport, TransportResponse,
    PLAYER_ID_HEADER,
};
