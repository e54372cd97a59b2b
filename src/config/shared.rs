//! Shared field structures for sing-box configuration.
//!
//! TLS blocks are embedded in every proxy outbound; the domain strategy is
//! used by the DNS section.

use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Domain strategy for resolving domain names
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DomainStrategy {
    PreferIpv4,
    PreferIpv6,
    Ipv4Only,
    Ipv6Only,
}

// ============================================================================
// TLS
// ============================================================================

/// Outbound TLS block
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OutboundTlsConfig {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Server name used for verification and SNI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utls: Option<UtlsConfig>,

    /// Accept any server certificate. Emitted only when the link format
    /// carries the flag (hysteria2), even when false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<OutboundRealityConfig>,
}

impl OutboundTlsConfig {
    /// Enabled TLS block with a server name and a uTLS fingerprint
    pub fn with_fingerprint(server_name: String, utls_enabled: bool, fingerprint: String) -> Self {
        Self {
            enabled: true,
            server_name: Some(server_name),
            utls: Some(UtlsConfig {
                enabled: utls_enabled,
                fingerprint: Some(fingerprint),
            }),
            ..Default::default()
        }
    }
}

/// uTLS client hello fingerprint
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UtlsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Reality parameters
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OutboundRealityConfig {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(default)]
    pub short_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_utls_still_serialized() {
        let tls = OutboundTlsConfig::with_fingerprint("a.com".into(), false, "chrome".into());
        let json = serde_json::to_value(&tls).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "enabled": true,
                "server_name": "a.com",
                "utls": {"enabled": false, "fingerprint": "chrome"}
            })
        );
    }

    #[test]
    fn test_reality_without_public_key() {
        let reality = OutboundRealityConfig {
            enabled: true,
            public_key: None,
            short_id: String::new(),
        };
        let json = serde_json::to_value(&reality).unwrap();
        assert_eq!(json, serde_json::json!({"enabled": true, "short_id": ""}));
    }

    #[test]
    fn test_domain_strategy_names() {
        assert_eq!(
            serde_json::to_string(&DomainStrategy::Ipv4Only).unwrap(),
            r#""ipv4_only""#
        );
    }
}
