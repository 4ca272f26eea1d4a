// Connection lifecycle: one actor task owns the session, the pending-request map and
// the aggregator, so every state change happens on a single logical queue.
//
// Phases: Connecting -> Connected -> (session lost) Backoff -> Connecting ...
//         any phase -> (user close) Closed, then drain pending timeouts and exit.

use chrono::Local;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use crate::aggregator::{AggregatorConfig, SummaryAggregator};
use crate::client::MonitorClient;
use crate::correlator::{Completion, Reply, RequestCorrelator, Resolution};
use crate::error::ClientError;
use crate::models::{DashboardView, DerivedSummary, Snapshot};
use crate::protocol::{self, Action, Frame, Inbound};
use crate::transport::{Connector, FrameSink, Session, WsConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// What happens to in-flight requests when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Leave them pending; each ends on its own timeout or a response after reconnect.
    #[default]
    Keep,
    /// Reject them all with `ClientError::Disconnected` as soon as the session ends.
    Reject,
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
    pub command_capacity: usize,
    pub pending_policy: PendingPolicy,
    /// Issue `get_summary` every time a session opens.
    pub refresh_on_connect: bool,
    pub aggregator: AggregatorConfig,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            command_capacity: 64,
            pending_policy: PendingPolicy::Keep,
            refresh_on_connect: true,
            aggregator: AggregatorConfig::default(),
        }
    }
}

pub(crate) enum Command {
    Invoke {
        action: Action,
        payload: Value,
        timeout: Duration,
        reply: Reply,
    },
    Ingest {
        snapshot: Box<Snapshot>,
        reply: oneshot::Sender<DerivedSummary>,
    },
    Close,
}

/// Session-independent state. Split from the manager so the connector future and the
/// command receiver can be borrowed alongside it.
struct Core {
    options: ConnectionOptions,
    correlator: RequestCorrelator,
    aggregator: SummaryAggregator,
    status_tx: watch::Sender<ConnectionStatus>,
    view_tx: watch::Sender<Option<Arc<DashboardView>>>,
    user_closed: bool,
}

pub struct ConnectionManager<C: Connector> {
    url: String,
    connector: C,
    commands: mpsc::Receiver<Command>,
    core: Core,
}

impl ConnectionManager<WsConnector> {
    /// Starts the connection task for a WebSocket URL.
    pub fn connect(
        url: impl Into<String>,
        options: ConnectionOptions,
    ) -> (MonitorClient, tokio::task::JoinHandle<()>) {
        Self::connect_with(WsConnector, url, options)
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Starts the connection task with a custom connector.
    pub fn connect_with(
        connector: C,
        url: impl Into<String>,
        options: ConnectionOptions,
    ) -> (MonitorClient, tokio::task::JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(options.command_capacity.max(1));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (view_tx, view_rx) = watch::channel(None);
        let client = MonitorClient::new(cmd_tx, status_rx, view_rx, options.request_timeout);

        let url = url.into();
        let span = tracing::info_span!("connection", url = %url);
        let manager = Self {
            url,
            connector,
            commands: cmd_rx,
            core: Core {
                aggregator: SummaryAggregator::new(options.aggregator),
                correlator: RequestCorrelator::new(),
                options,
                status_tx,
                view_tx,
                user_closed: false,
            },
        };
        let handle = tokio::spawn(manager.run().instrument(span));
        (client, handle)
    }

    async fn run(mut self) {
        while !self.core.user_closed {
            self.core.set_status(ConnectionStatus::Connecting);
            if let Some(session) = self.establish().await {
                self.core.set_status(ConnectionStatus::Connected);
                self.drive(session).await;
            }
            self.core.set_status(ConnectionStatus::Disconnected);
            self.core.session_ended();
            if self.core.user_closed {
                break;
            }
            tracing::info!(
                delay_ms = self.core.options.reconnect_delay.as_millis() as u64,
                "reconnect scheduled"
            );
            self.backoff().await;
        }
        self.drain().await;
        tracing::debug!("connection task finished");
    }

    /// Connecting phase. Returns `None` on failure or when closed by the user meanwhile.
    async fn establish(&mut self) -> Option<Session> {
        let connecting = self.connector.connect(&self.url);
        tokio::pin!(connecting);
        loop {
            tokio::select! {
                result = &mut connecting => {
                    return match result {
                        Ok(session) => Some(session),
                        Err(e) => {
                            tracing::warn!(error = %e, "connect failed");
                            None
                        }
                    };
                }
                cmd = self.commands.recv() => self.core.handle_offline(cmd),
                _ = wait_until(self.core.correlator.next_deadline()) => {
                    self.core.correlator.expire(Instant::now());
                }
            }
            if self.core.user_closed {
                return None;
            }
        }
    }

    /// Connected phase. Returns when the session is lost or the user closes it.
    async fn drive(&mut self, session: Session) {
        let Session {
            mut sink,
            mut stream,
        } = session;
        tracing::info!("connected");

        if self.core.options.refresh_on_connect {
            let frame = self.core.correlator.register(
                Action::GetSummary,
                Value::Null,
                self.core.options.request_timeout,
                Completion::Refresh,
            );
            if !send_frame(&mut sink, &frame).await {
                return;
            }
        }

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(text)) => self.core.dispatch(&text),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "session error");
                        return;
                    }
                    None => {
                        tracing::info!("session closed by server");
                        return;
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Invoke { action, payload, timeout, reply }) => {
                        let frame = self.core.correlator.register(
                            action,
                            payload,
                            timeout,
                            Completion::Caller(reply),
                        );
                        if !send_frame(&mut sink, &frame).await {
                            return;
                        }
                    }
                    Some(Command::Ingest { snapshot, reply }) => {
                        let _ = reply.send(self.core.publish(&snapshot));
                    }
                    Some(Command::Close) | None => {
                        self.core.user_closed = true;
                        tracing::info!("closed by user");
                        let _ = sink.close().await;
                        return;
                    }
                },
                _ = wait_until(self.core.correlator.next_deadline()) => {
                    self.core.correlator.expire(Instant::now());
                }
            }
        }
    }

    /// Waits out the reconnect delay; a user close cancels the wait.
    async fn backoff(&mut self) {
        let resume = tokio::time::sleep(self.core.options.reconnect_delay);
        tokio::pin!(resume);
        loop {
            tokio::select! {
                _ = &mut resume => return,
                cmd = self.commands.recv() => {
                    self.core.handle_offline(cmd);
                    if self.core.user_closed {
                        return;
                    }
                }
                _ = wait_until(self.core.correlator.next_deadline()) => {
                    self.core.correlator.expire(Instant::now());
                }
            }
        }
    }

    /// After a user close: refuse new work and let remaining requests reach their timeouts.
    async fn drain(&mut self) {
        self.commands.close();
        self.core.correlator.discard_refreshes();
        let mut commands_open = true;
        while commands_open || !self.core.correlator.is_empty() {
            tokio::select! {
                cmd = self.commands.recv(), if commands_open => match cmd {
                    Some(cmd) => self.core.handle_offline(Some(cmd)),
                    None => commands_open = false,
                },
                _ = wait_until(self.core.correlator.next_deadline()) => {
                    self.core.correlator.expire(Instant::now());
                }
            }
        }
    }
}

impl Core {
    fn set_status(&mut self, status: ConnectionStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            tracing::debug!(?previous, ?status, "connection status changed");
        }
    }

    fn session_ended(&mut self) {
        if self.options.pending_policy == PendingPolicy::Reject {
            let n = self.correlator.fail_all();
            if n > 0 {
                tracing::debug!(rejected = n, "pending requests rejected on disconnect");
            }
        }
    }

    /// Commands that arrive while no session is open.
    fn handle_offline(&mut self, cmd: Option<Command>) {
        match cmd {
            Some(Command::Invoke { reply, .. }) => {
                let _ = reply.send(Err(ClientError::NotConnected));
            }
            Some(Command::Ingest { snapshot, reply }) => {
                let _ = reply.send(self.publish(&snapshot));
            }
            Some(Command::Close) => {
                tracing::info!("closed by user");
                self.user_closed = true;
            }
            None => self.user_closed = true,
        }
    }

    fn dispatch(&mut self, text: &str) {
        match protocol::decode(text) {
            Inbound::Callback { id, payload } => match self.correlator.resolve(&id, payload) {
                Resolution::Refresh(payload) => match serde_json::from_value::<Snapshot>(payload) {
                    Ok(snapshot) => {
                        self.publish(&snapshot);
                    }
                    Err(e) => tracing::debug!(error = %e, "summary refresh payload dropped"),
                },
                Resolution::Unmatched => tracing::debug!(id = %id, "unmatched response ignored"),
                Resolution::Delivered => {}
            },
            Inbound::CallbackError { id, message } => {
                if self.correlator.reject(&id, message) == Resolution::Unmatched {
                    tracing::debug!(id = %id, "unmatched error response ignored");
                }
            }
            Inbound::Summary(snapshot) => {
                self.publish(&snapshot);
            }
            Inbound::Blacklist(payload) => {
                tracing::info!(payload = %payload, "blacklist event");
            }
            Inbound::Malformed => {
                tracing::debug!(len = text.len(), "malformed frame dropped");
            }
        }
    }

    fn publish(&mut self, snapshot: &Snapshot) -> DerivedSummary {
        let view = self.aggregator.view(snapshot, Local::now().naive_local());
        let summary = view.summary.clone();
        self.view_tx.send_replace(Some(Arc::new(view)));
        summary
    }
}

/// Sends one frame; `false` means the session is unusable.
async fn send_frame(sink: &mut FrameSink, frame: &Frame) -> bool {
    let text = match frame.to_text() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, action = %frame.action, "frame not encodable");
            return true;
        }
    };
    match sink.send(text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, action = %frame.action, "send failed");
            false
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
