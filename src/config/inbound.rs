use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

// ============================================================================
// Inbound Enum
// ============================================================================

/// Local listeners of the generated client profile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Virtual interface capturing system traffic
    Tun(TunInbound),
    /// Combined HTTP/SOCKS proxy listener
    Mixed(MixedInbound),
}

/// Listen fields shared by inbounds
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ListenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,

    /// Legacy inbound sniffing switch
    #[serde(default, skip_serializing_if = "is_false")]
    pub sniff: bool,
}

// ============================================================================
// TUN
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TunInbound {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,

    /// IPv4 prefix assigned to the interface (legacy single-address form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inet4_address: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_route: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub strict_route: bool,

    /// `system`, `gvisor` or `mixed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(flatten)]
    pub listen: ListenFields,
}

// ============================================================================
// Mixed
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MixedInbound {
    pub tag: String,

    #[serde(flatten)]
    pub listen: ListenFields,
}
