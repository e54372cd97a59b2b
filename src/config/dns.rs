//! DNS section of the generated document, in the legacy server/rule layout
//! (servers addressed by URL, rules routing straight to a server tag).

use serde::{Deserialize, Serialize};

use crate::config::shared::DomainStrategy;
use crate::config::util::string_or_vec;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Dns {
    #[serde(default)]
    pub servers: Vec<DnsServer>,

    #[serde(default)]
    pub rules: Vec<DnsRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DomainStrategy>,

    /// Always written out, the generated profile states it explicitly
    #[serde(default)]
    pub disable_cache: bool,
}

/// Upstream resolver
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DnsServer {
    /// `tls://`, `https://`, a bare IP or `local`
    pub address: String,

    pub tag: String,

    /// Outbound used to reach the resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour: Option<String>,
}

impl DnsServer {
    pub fn new(address: &str, tag: &str, detour: &str) -> Self {
        Self {
            address: address.to_string(),
            tag: tag.to_string(),
            detour: Some(detour.to_string()),
        }
    }
}

/// DNS rule; a rule without matchers catches everything
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DnsRule {
    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub geosite: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub domain_suffix: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub query_type: Vec<String>,

    pub server: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_ttl: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_rule_has_only_server() {
        let rule = DnsRule {
            server: "dns_system".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            serde_json::json!({"server": "dns_system"})
        );
    }

    #[test]
    fn test_disable_cache_written_when_false() {
        let dns = Dns {
            strategy: Some(DomainStrategy::Ipv4Only),
            ..Default::default()
        };
        let json = serde_json::to_value(&dns).unwrap();
        assert_eq!(json["disable_cache"], serde_json::json!(false));
        assert_eq!(json["strategy"], serde_json::json!("ipv4_only"));
    }

    #[test]
    fn test_rule_accepts_scalar_matcher() {
        let rule: DnsRule =
            serde_json::from_str(r#"{"query_type": "A", "server": "dns_cf_tls"}"#).unwrap();
        assert_eq!(rule.query_type, vec!["A"]);
    }
}
