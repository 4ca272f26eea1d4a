use serde::Deserialize;
use tokio::time::Duration;

use crate::aggregator::AggregatorConfig;
use crate::connection::{ConnectionOptions, PendingPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `host[:port]` of the backend.
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Use `wss://` instead of `ws://`.
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/ws".into()
}

impl ServerConfig {
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
    /// "keep" (requests outlive a dropped session until their timeout) or "reject".
    #[serde(default)]
    pub pending_policy: PendingPolicy,
    #[serde(default = "default_true")]
    pub refresh_on_connect: bool,
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_command_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            command_capacity: default_command_capacity(),
            pending_policy: PendingPolicy::default(),
            refresh_on_connect: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    /// Points kept in the recent-interval window.
    #[serde(default = "default_window")]
    pub window_capacity: usize,
    /// Spacing of synthetic padding points in the recent-interval window.
    #[serde(default = "default_sample_spacing_secs")]
    pub sample_spacing_secs: u64,
    #[serde(default = "default_window")]
    pub history_days: usize,
}

fn default_window() -> usize {
    30
}

fn default_sample_spacing_secs() -> u64 {
    5
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window(),
            sample_spacing_secs: default_sample_spacing_secs(),
            history_days: default_window(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often the binary logs the latest traffic totals at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            reconnect_delay: Duration::from_millis(self.connection.reconnect_delay_ms),
            request_timeout: Duration::from_millis(self.connection.request_timeout_ms),
            command_capacity: self.connection.command_capacity,
            pending_policy: self.connection.pending_policy,
            refresh_on_connect: self.connection.refresh_on_connect,
            aggregator: AggregatorConfig {
                window_capacity: self.summary.window_capacity,
                sample_spacing_secs: self.summary.sample_spacing_secs,
                history_days: self.summary.history_days,
            },
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.server.path.starts_with('/'),
            "server.path must start with '/', got {:?}",
            self.server.path
        );
        anyhow::ensure!(
            self.connection.reconnect_delay_ms > 0,
            "connection.reconnect_delay_ms must be > 0, got {}",
            self.connection.reconnect_delay_ms
        );
        anyhow::ensure!(
            self.connection.request_timeout_ms > 0,
            "connection.request_timeout_ms must be > 0, got {}",
            self.connection.request_timeout_ms
        );
        anyhow::ensure!(
            self.connection.command_capacity > 0,
            "connection.command_capacity must be > 0, got {}",
            self.connection.command_capacity
        );
        anyhow::ensure!(
            self.summary.window_capacity > 0,
            "summary.window_capacity must be > 0, got {}",
            self.summary.window_capacity
        );
        anyhow::ensure!(
            self.summary.sample_spacing_secs > 0,
            "summary.sample_spacing_secs must be > 0, got {}",
            self.summary.sample_spacing_secs
        );
        anyhow::ensure!(
            self.summary.history_days > 0,
            "summary.history_days must be > 0, got {}",
            self.summary.history_days
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
