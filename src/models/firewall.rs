// Request/response payloads for the firewall control actions

use serde::{Deserialize, Serialize};

/// XDP attach mode reported by `get_link_type`; serializes lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Offload,
    Driver,
    Generic,
    #[serde(other)]
    Unknown,
}

/// A rule port entry: either a single port or a textual range such as `"8000-8100"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Port(u16),
    Text(String),
}

/// Match rule as stored by the backend (`get_rules` / `set_rules`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_name: String,
    #[serde(default)]
    pub ip: Vec<String>,
    #[serde(default)]
    pub port: Vec<PortSpec>,
    #[serde(default)]
    pub mac: Vec<String>,
    #[serde(default)]
    pub eth_type: Vec<String>,
    #[serde(default)]
    pub ip_protocol: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    #[serde(default)]
    pub mac: Vec<String>,
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub ipv6: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistKind {
    Mac,
    Ipv4,
    Ipv6,
}

/// Payload of `change_black`: add (`inc = true`) or remove one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistChange {
    pub inc: bool,
    #[serde(rename = "type")]
    pub kind: BlacklistKind,
    pub data: String,
}

impl BlacklistChange {
    pub fn add(kind: BlacklistKind, data: impl Into<String>) -> Self {
        Self {
            inc: true,
            kind,
            data: data.into(),
        }
    }

    pub fn remove(kind: BlacklistKind, data: impl Into<String>) -> Self {
        Self {
            inc: false,
            kind,
            data: data.into(),
        }
    }
}

/// Paged filter for `get_match_list`. Unset filters are omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_type: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_proto: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl MatchQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }
}

/// Protocol field as sent by the backend: numeric code or symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProtocolId {
    Code(u16),
    Name(String),
}

/// One matched packet, enriched with geo data (`get_match_list` result row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub src_ip: String,
    pub dst_ip: String,
    #[serde(default)]
    pub src_port: u16,
    #[serde(default)]
    pub dst_port: u16,
    #[serde(default)]
    pub src_mac: String,
    #[serde(default)]
    pub dst_mac: String,
    pub eth_proto: ProtocolId,
    pub ip_proto: ProtocolId,
    #[serde(default)]
    pub pkt_size: u32,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_code: String,
}
