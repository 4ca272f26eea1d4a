// Server-pushed aggregate traffic state (payload of `broadcast-summary` and `get_summary`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Packet count and byte size pair used by every per-dimension map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub size: u64,
}

impl Counter {
    pub fn new(count: u64, size: u64) -> Self {
        Self { count, size }
    }
}

/// Per-destination breakdown of one source's inbound traffic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputTarget {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub last_time: i64,
    #[serde(default)]
    pub summary: Counter,
    #[serde(default)]
    pub port: HashMap<u16, Counter>,
    #[serde(default)]
    pub eth_type: HashMap<String, Counter>,
    #[serde(default)]
    pub ip_proto: HashMap<String, Counter>,
}

/// Inbound traffic record for one source address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPacket {
    #[serde(default)]
    pub src_mac: String,
    #[serde(default)]
    pub src_ip: String,
    #[serde(default)]
    pub summary: Counter,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub last_time: i64,
    #[serde(default)]
    pub target: HashMap<String, InputTarget>,
}

/// Full aggregate state at one point in time. Superseded wholesale by the next one.
/// Missing maps decode as empty so a partial payload is still usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub country_summary: HashMap<String, Counter>,
    #[serde(default)]
    pub city_summary: HashMap<String, Counter>,
    #[serde(default)]
    pub eth_type_summary: HashMap<String, Counter>,
    #[serde(default)]
    pub ip_proto_summary: HashMap<String, Counter>,
    /// Keyed by local calendar date, `YYYY-MM-DD`.
    #[serde(default)]
    pub day_summary: HashMap<String, Counter>,
    #[serde(default)]
    pub match_summary: HashMap<String, Counter>,
    #[serde(default)]
    pub dst_port_summary: HashMap<u16, Counter>,
    /// Keyed by source address.
    #[serde(default)]
    pub input_packets: HashMap<String, InputPacket>,
    #[serde(default)]
    pub black_summary: HashMap<String, u64>,
}

impl Snapshot {
    /// Grand total over the day-keyed map.
    pub fn day_total(&self) -> Counter {
        self.day_summary
            .values()
            .fold(Counter::default(), |acc, c| Counter {
                count: acc.count.saturating_add(c.count),
                size: acc.size.saturating_add(c.size),
            })
    }
}
