// Shared test helpers: in-memory transport standing in for the backend, snapshot builders

#![allow(dead_code)]

use fwmonitor::ConnectionOptions;
use fwmonitor::error::TransportError;
use fwmonitor::models::{Counter, Snapshot};
use fwmonitor::protocol::Frame;
use fwmonitor::transport::{Connector, Session};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Backend end of one in-memory session. Dropping it ends the session from the server side.
pub struct ServerSide {
    pub from_client: mpsc::UnboundedReceiver<String>,
    pub to_client: mpsc::UnboundedSender<Result<String, TransportError>>,
}

impl ServerSide {
    pub async fn recv_frame(&mut self) -> Frame {
        let text = self
            .from_client
            .recv()
            .await
            .expect("client closed the session");
        serde_json::from_str(&text).expect("client sent a valid frame")
    }

    pub fn send_raw(&self, text: &str) {
        let _ = self.to_client.send(Ok(text.to_string()));
    }

    pub fn send(&self, frame: Value) {
        self.send_raw(&frame.to_string());
    }

    pub fn reply(&self, id: &str, payload: Value) {
        self.send(json!({ "id": id, "action": "callback", "payload": payload }));
    }

    pub fn reply_error(&self, id: &str, message: &str) {
        self.send(json!({ "id": id, "action": "callback-error", "payload": message }));
    }

    pub fn broadcast_summary(&self, snapshot: &Snapshot) {
        self.send(json!({ "id": "", "action": "broadcast-summary", "payload": snapshot }));
    }

    pub fn fail(&self) {
        let _ = self.to_client.send(Err(TransportError::Closed));
    }
}

/// Connector whose sessions are handed to the test as `ServerSide`s.
#[derive(Clone)]
pub struct MemoryConnector {
    sessions: mpsc::UnboundedSender<ServerSide>,
    pub attempts: Arc<AtomicUsize>,
    pub refuse: Arc<AtomicBool>,
}

impl MemoryConnector {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

pub fn memory_backend() -> (MemoryConnector, mpsc::UnboundedReceiver<ServerSide>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connector = MemoryConnector {
        sessions: tx,
        attempts: Arc::new(AtomicUsize::new(0)),
        refuse: Arc::new(AtomicBool::new(false)),
    };
    (connector, rx)
}

impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<Session, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let (c2s_tx, c2s_rx) = mpsc::unbounded_channel::<String>();
        let (s2c_tx, s2c_rx) = mpsc::unbounded_channel::<Result<String, TransportError>>();
        self.sessions
            .send(ServerSide {
                from_client: c2s_rx,
                to_client: s2c_tx,
            })
            .map_err(|_| TransportError::Closed)?;

        let sink = futures_util::sink::unfold(c2s_tx, |tx, text: String| async move {
            tx.send(text).map_err(|_| TransportError::Closed)?;
            Ok::<_, TransportError>(tx)
        });
        let stream = futures_util::stream::unfold(s2c_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Session::new(Box::pin(sink), Box::pin(stream)))
    }
}

/// Defaults with the on-connect summary refresh turned off, so the first frame a
/// test sees is the one it sent.
pub fn options() -> ConnectionOptions {
    ConnectionOptions {
        refresh_on_connect: false,
        ..Default::default()
    }
}

pub fn today_key() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Snapshot whose day map holds a single entry for today.
pub fn snapshot_with_today(count: u64, size: u64) -> Snapshot {
    let mut s = Snapshot::default();
    s.day_summary.insert(today_key(), Counter::new(count, size));
    s
}
