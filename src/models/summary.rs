// Client-computed, display-ready views of a Snapshot

use serde::{Deserialize, Serialize};

use super::{Counter, InputPacket};

/// One entry of a ranked dimension: key, raw counters and percentage share (never below 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry<K> {
    pub key: K,
    pub counter: Counter,
    pub share: f64,
}

/// One time bucket of a rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPoint {
    pub label: String,
    pub packets: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSummary {
    /// Packets since the previous snapshot (0 on the first one).
    pub inc_packets: u64,
    /// Bytes since the previous snapshot (0 on the first one).
    pub inc_bytes: u64,
    pub total_packets: u64,
    pub total_bytes: u64,
    pub day_packets: u64,
    pub day_bytes: u64,
    pub country: Vec<RankedEntry<String>>,
    pub city: Vec<RankedEntry<String>>,
    pub eth_type: Vec<RankedEntry<String>>,
    pub ip_proto: Vec<RankedEntry<String>>,
    pub matched: Vec<RankedEntry<String>>,
    pub dst_port: Vec<RankedEntry<u16>>,
    /// Blacklist hits per address; `counter.count` is the hit count, `counter.size` is always 0.
    pub black: Vec<RankedEntry<String>>,
    /// Sources ranked by total packet count, descending.
    pub input: Vec<InputPacket>,
}

/// Everything presentation code needs after one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub summary: DerivedSummary,
    /// Recent-interval window, always padded to full capacity.
    pub recent: Vec<WindowPoint>,
    /// Trailing calendar days, oldest first.
    pub daily: Vec<WindowPoint>,
}
