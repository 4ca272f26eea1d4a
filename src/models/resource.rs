// Host resource usage reported by `get_system_resource_usage`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub name: String,
    pub physical_cores: u32,
    pub logical_cores: u32,
    /// Fractions in 0..=1, one per logical core.
    #[serde(default)]
    pub usage_per_core: Vec<f64>,
    pub total_usage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    /// Percent.
    pub usage_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub device: String,
    pub fs_type: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub usage_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    /// Unix seconds.
    pub boot_time: u64,
    pub os: String,
    pub platform: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketAddrInfo {
    pub ip: String,
    pub port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConnection {
    pub family: u32,
    #[serde(rename = "type")]
    pub kind: u32,
    pub localaddr: SocketAddrInfo,
    pub remoteaddr: SocketAddrInfo,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddr {
    pub addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub index: u32,
    pub mtu: u32,
    pub name: String,
    #[serde(default)]
    pub hardware_addr: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub addrs: Vec<NetworkAddr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUsage {
    #[serde(default)]
    pub connections: Vec<NetworkConnection>,
    #[serde(default)]
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemResourceUsage {
    pub cpu: CpuUsage,
    pub memory: MemoryUsage,
    #[serde(default)]
    pub disk: Vec<DiskUsage>,
    pub host: HostInfo,
    #[serde(default)]
    pub network: NetworkUsage,
}
