// Library for the binary and integration tests

pub mod aggregator;
pub mod client;
pub mod config;
pub mod connection;
pub mod correlator;
pub mod error;
pub mod models;
pub mod protocol;
pub mod transport;
pub mod window;

pub use client::MonitorClient;
pub use connection::{ConnectionManager, ConnectionOptions, ConnectionStatus, PendingPolicy};
pub use error::ClientError;
