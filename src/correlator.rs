// Request/response correlation over a frame transport that has none natively.
// Timeouts are deadlines owned by the pending entry; the connection loop sleeps until
// `next_deadline()` and calls `expire()`. Removing an entry cancels its timer.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

use crate::error::ClientError;
use crate::protocol::{Action, Frame};

/// Deadline used when `created_at + timeout` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

pub type Reply = oneshot::Sender<Result<Value, ClientError>>;

/// Who is waiting for the response.
#[derive(Debug)]
pub enum Completion {
    Caller(Reply),
    /// Summary refresh issued by the connection itself; the payload is handed back.
    Refresh,
}

#[derive(Debug)]
pub struct PendingRequest {
    pub action: Action,
    pub created_at: Instant,
    pub deadline: Instant,
    completion: Completion,
}

impl PendingRequest {
    fn finish(self, result: Result<Value, ClientError>) -> Resolution {
        match self.completion {
            Completion::Caller(reply) => {
                // Receiver may already be gone; nothing left to notify.
                let _ = reply.send(result);
                Resolution::Delivered
            }
            Completion::Refresh => match result {
                Ok(payload) => Resolution::Refresh(payload),
                Err(e) => {
                    tracing::debug!(error = %e, "summary refresh failed");
                    Resolution::Delivered
                }
            },
        }
    }
}

/// Outcome of feeding a response frame to the correlator.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    Delivered,
    Refresh(Value),
    Unmatched,
}

#[derive(Debug, Default)]
pub struct RequestCorrelator {
    pending: HashMap<String, PendingRequest>,
    last_id: u64,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond timestamp, bumped so ids are strictly increasing and never reused.
    fn next_id(&mut self) -> String {
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    /// Registers a pending request and returns the frame to send.
    pub fn register(
        &mut self,
        action: Action,
        payload: Value,
        timeout: Duration,
        completion: Completion,
    ) -> Frame {
        let id = self.next_id();
        let created_at = Instant::now();
        let deadline = created_at
            .checked_add(timeout)
            .unwrap_or_else(|| created_at + FAR_FUTURE);
        self.pending.insert(
            id.clone(),
            PendingRequest {
                action,
                created_at,
                deadline,
                completion,
            },
        );
        Frame::request(id, action, payload)
    }

    /// `callback`: resolves and removes the entry. Unknown ids are a no-op.
    pub fn resolve(&mut self, id: &str, payload: Value) -> Resolution {
        match self.pending.remove(id) {
            Some(req) => req.finish(Ok(payload)),
            None => Resolution::Unmatched,
        }
    }

    /// `callback-error`: rejects with the server's message and removes the entry.
    pub fn reject(&mut self, id: &str, message: String) -> Resolution {
        match self.pending.remove(id) {
            Some(req) => req.finish(Err(ClientError::ServerError(message))),
            None => Resolution::Unmatched,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Rejects every entry whose deadline is at or before `now`. Returns how many expired.
    pub fn expire(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(req) = self.pending.remove(id) {
                let after_ms = req.deadline.duration_since(req.created_at).as_millis() as u64;
                tracing::debug!(id = %id, action = %req.action, after_ms, "request timed out");
                let err = ClientError::Timeout {
                    action: req.action.as_str(),
                    after_ms,
                };
                req.finish(Err(err));
            }
        }
        expired.len()
    }

    /// Rejects everything still pending with `Disconnected`.
    pub fn fail_all(&mut self) -> usize {
        let n = self.pending.len();
        for (_, req) in self.pending.drain() {
            req.finish(Err(ClientError::Disconnected));
        }
        n
    }

    /// Drops internally issued refreshes; nobody waits on them once the connection is closing.
    pub fn discard_refreshes(&mut self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, p| matches!(p.completion, Completion::Caller(_)));
        before - self.pending.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
