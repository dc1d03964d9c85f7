//! Scripted transport shared by the heartbeat tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::transport::{HeartbeatRequest, HeartbeatTransport, TransportResponse};
use crate::error::{BeaconError, Result};

enum Reply {
    Status(u16, &'static str),
    Fail,
    Panic,
}

/// Records every post and answers with a fixed reply after `delay`.
pub(crate) struct MockTransport {
    reply: Reply,
    delay: Duration,
    calls: AtomicUsize,
    player_ids: Mutex<Vec<String>>,
}

impl MockTransport {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            player_ids: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ok() -> Self {
        Self::with_reply(Reply::Status(200, "{\"status\":\"ok\"}"))
    }

    pub(crate) fn status(status: u16, body: &'static str) -> Self {
        Self::with_reply(Reply::Status(status, body))
    }

    pub(crate) fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    pub(crate) fn panicking() -> Self {
        Self::with_reply(Reply::Panic)
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn player_ids(&self) -> Vec<String> {
        self.player_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl HeartbeatTransport for MockTransport {
    async fn post(&self, request: &HeartbeatRequest) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.player_ids
            .lock()
            .unwrap()
            .push(request.player_id.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.reply {
            Reply::Status(status, body) => Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
            Reply::Fail => Err(BeaconError::Transport("connection reset".to_string())),
            Reply::Panic => panic!("transport exploded"),
        }
    }
}
