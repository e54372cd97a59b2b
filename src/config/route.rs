use serde::{Deserialize, Serialize};

use crate::config::util::{is_false, string_or_vec};

/// Route section of the generated document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Route {
    #[serde(default)]
    pub rules: Vec<RouteRule>,

    /// Outbound for traffic no rule matched
    #[serde(default, rename = "final", skip_serializing_if = "Option::is_none")]
    pub final_outbound: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_detect_interface: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub override_android_vpn: bool,
}

/// Legacy route rule: matchers plus a target outbound
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RouteRule {
    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub protocol: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub domain: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub domain_keyword: Vec<String>,

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
    pub geosite: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub geoip: Vec<String>,

    #[serde(
        default,
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ip_cidr: Vec<String>,

    pub outbound: String,
}

impl RouteRule {
    /// Empty rule targeting `outbound`; fill in matchers with struct update syntax
    pub fn to(outbound: &str) -> Self {
        Self {
            outbound: outbound.to_string(),
            ..Default::default()
        }
    }
}
