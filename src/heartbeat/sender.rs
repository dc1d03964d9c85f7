//! One heartbeat attempt, guarded against overlap.

use std::sync::Arc;

use tracing::debug;

use super::guard::SendGuard;
use super::transport::{HeartbeatRequest, HeartbeatTransport};
use crate::error::BeaconError;

/// What happened to a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Another send was still in flight; this tick was dropped.
    Skipped,
    /// The service answered 2xx.
    Delivered,
    /// The service answered with a non-2xx status.
    Rejected { status: u16 },
    /// No reply: network error, timeout, or transport failure.
    Failed,
}

/// Sends the fixed heartbeat request, at most one at a time.
pub struct HeartbeatSender {
    transport: Arc<dyn HeartbeatTransport>,
    request: HeartbeatRequest,
    guard: SendGuard,
}

impl HeartbeatSender {
    pub fn new(transport: Arc<dyn HeartbeatTransport>, request: HeartbeatRequest) -> Self {
        Self {
            transport,
            request,
            guard: SendGuard::new(),
        }
    }

    pub fn request(&self) -> &HeartbeatRequest {
        &self.request
    }

    /// Whether a send is currently in flight.
    pub fn is_sending(&self) -> bool {
        self.guard.is_held()
    }

    /// Try to send one heartbeat.
    ///
    /// Never fails: every error is logged at debug level and folded into the
    /// outcome. The in-flight flag is released on every exit path.
    pub async fn attempt_send(&self) -> SendOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!("Heartbeat already in progress, skipping");
            return SendOutcome::Skipped;
        };

        debug!("Sending heartbeat to server");
        match self.transport.post(&self.request).await {
            Ok(response) if response.is_success() => {
                debug!("Heartbeat successful: {}", response.body);
                SendOutcome::Delivered
            }
            Ok(response) => {
                debug!("Server returned {}: {}", response.status, response.body);
                SendOutcome::Rejected {
                    status: response.status,
                }
            }
            Err(BeaconError::Http(e)) if e.is_timeout() => {
                debug!("Heartbeat timed out");
                SendOutcome::Failed
            }
            Err(BeaconError::Http(e)) => {
                debug!("Network error: {}", e);
                SendOutcome::Failed
            }
            Err(e) => {
                debug!("Error: {} - {}", e.kind(), e);
                SendOutcome::Failed
            }
        }
    }
}
