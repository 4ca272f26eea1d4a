// Domain models for the firewall backend's wire payloads and the client-side derived views

mod firewall;
mod resource;
mod snapshot;
mod summary;

pub use firewall::{
    Blacklist, BlacklistChange, BlacklistKind, LinkType, MatchQuery, PacketRecord, PortSpec,
    ProtocolId, Rule,
};
pub use resource::{
    CpuUsage, DiskUsage, HostInfo, MemoryUsage, NetworkAddr, NetworkConnection, NetworkInterface,
    NetworkUsage, SocketAddrInfo, SystemResourceUsage,
};
pub use snapshot::{Counter, InputPacket, InputTarget, Snapshot};
pub use summary::{DashboardView, DerivedSummary, RankedEntry, WindowPoint};
