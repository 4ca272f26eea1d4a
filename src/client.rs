// Cloneable handle to the connection task: request/response calls, typed actions,
// connection status and the latest dashboard view.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Duration;

use crate::connection::{Command, ConnectionStatus};
use crate::error::ClientError;
use crate::models::{
    Blacklist, BlacklistChange, DashboardView, DerivedSummary, LinkType, MatchQuery,
    PacketRecord, Rule, Snapshot, SystemResourceUsage,
};
use crate::protocol::Action;

#[derive(Clone)]
pub struct MonitorClient {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    view: watch::Receiver<Option<Arc<DashboardView>>>,
    timeout: Duration,
}

impl MonitorClient {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        status: watch::Receiver<ConnectionStatus>,
        view: watch::Receiver<Option<Arc<DashboardView>>>,
        timeout: Duration,
    ) -> Self {
        Self {
            commands,
            status,
            view,
            timeout,
        }
    }

    /// Same connection, different default request timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Resolves once the status equals `target`; `false` if the connection task is gone.
    pub async fn wait_for_status(&self, target: ConnectionStatus) -> bool {
        let mut rx = self.status.clone();
        rx.wait_for(|s| *s == target).await.is_ok()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Latest view, `None` until the first snapshot arrives.
    pub fn latest_view(&self) -> Option<Arc<DashboardView>> {
        self.view.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<Option<Arc<DashboardView>>> {
        self.view.clone()
    }

    /// Sends `action` with the default timeout and waits for the correlated response.
    pub async fn invoke(&self, action: Action, payload: Value) -> Result<Value, ClientError> {
        self.invoke_with_timeout(action, payload, self.timeout).await
    }

    /// Fails with `NotConnected` before registering anything when no session is open.
    pub async fn invoke_with_timeout(
        &self,
        action: Action,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Invoke {
                action,
                payload,
                timeout,
                reply,
            })
            .await
            .map_err(|_| ClientError::NotConnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)?
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: Action,
        payload: impl Serialize,
    ) -> Result<T, ClientError> {
        let payload = serde_json::to_value(payload)?;
        let value = self.invoke(action, payload).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Requests a user close; no reconnect follows. Pending requests still run to their timeouts.
    pub async fn close(&self) {
        if self.commands.send(Command::Close).await.is_err() {
            tracing::debug!("close requested after connection task ended");
        }
    }

    pub async fn ping(&self) -> Result<bool, ClientError> {
        let value = self.invoke(Action::Ping, Value::Null).await?;
        Ok(value.as_str() == Some("pong"))
    }

    pub async fn get_link_type(&self) -> Result<LinkType, ClientError> {
        self.call(Action::GetLinkType, ()).await
    }

    /// Fetches a snapshot and runs it through the same aggregation as broadcasts.
    pub async fn get_summary(&self) -> Result<DerivedSummary, ClientError> {
        let snapshot: Snapshot = self.call(Action::GetSummary, ()).await?;
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Ingest {
                snapshot: Box::new(snapshot),
                reply,
            })
            .await
            .map_err(|_| ClientError::NotConnected)?;
        rx.await.map_err(|_| ClientError::Disconnected)
    }

    pub async fn get_rules(&self) -> Result<Vec<Rule>, ClientError> {
        self.call(Action::GetRules, ()).await
    }

    /// Returns the number of rules the backend accepted.
    pub async fn set_rules(&self, rules: &[Rule]) -> Result<u64, ClientError> {
        self.call(Action::SetRules, rules).await
    }

    pub async fn get_match_list(&self, query: &MatchQuery) -> Result<Vec<PacketRecord>, ClientError> {
        self.call(Action::GetMatchList, query).await
    }

    pub async fn get_black_list(&self) -> Result<Blacklist, ClientError> {
        self.call(Action::GetBlackList, ()).await
    }

    pub async fn change_black(&self, change: &BlacklistChange) -> Result<bool, ClientError> {
        self.call(Action::ChangeBlack, change).await
    }

    pub async fn get_system_resource_usage(&self) -> Result<SystemResourceUsage, ClientError> {
        self.call(Action::GetSystemResourceUsage, ()).await
    }

    /// Turns `broadcast-summary` delivery for this client on or off.
    pub async fn change_broadcast_status(&self, enable: bool) -> Result<bool, ClientError> {
        self.call(Action::ChangeBroadcastStatus, enable).await
    }
}
