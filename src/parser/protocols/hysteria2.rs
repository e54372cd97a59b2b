//! Hysteria2 protocol parser
//!
//! Format: hysteria2://password@host:port?params#remark
//! The `hy2://` alias is rewritten to the canonical scheme before parsing.

use tracing::trace;
use url::Url;

use crate::config::outbound::{Hysteria2Obfs, Hysteria2Outbound, Outbound};
use crate::config::shared::OutboundTlsConfig;
use crate::error::{ConvertError, Result};
use crate::tag::sanitize_tag;

use super::{ProtocolParser, decoded_fragment, first_param, leading_u32, query_params, required_host};

const DEFAULT_UP_MBPS: u32 = 20;
const DEFAULT_DOWN_MBPS: u32 = 100;

// ============================================================================
// Hysteria2 Parser
// ============================================================================

/// Parser for Hysteria2 (hysteria2:// and hy2://) links
pub struct Hysteria2Parser {
    scheme: String,
}

impl Hysteria2Parser {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
        }
    }
}

impl ProtocolParser for Hysteria2Parser {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        trace!("Parsing Hysteria2 link");
        let canonical = match link.strip_prefix("hy2://") {
            Some(rest) => format!("hysteria2://{}", rest),
            None => link.to_string(),
        };
        let url =
            Url::parse(&canonical).map_err(|e| ConvertError::malformed("hysteria2", e.to_string()))?;

        let host = required_host(&url, "hysteria2")?;
        let server_port = url
            .port()
            .filter(|p| *p > 0)
            .ok_or_else(|| ConvertError::malformed("hysteria2", "missing port"))?;

        let password = [url.username(), url.password().unwrap_or_default()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .unwrap_or_default();

        let params = query_params(&url);

        let remark =
            decoded_fragment(&url).unwrap_or_else(|| format!("hy2_{}_{}", host, server_port));

        let bandwidth = |keys: &[&str], default: u32| {
            first_param(&params, keys)
                .and_then(leading_u32)
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let is_set = |key: &str| params.get(key).is_some_and(|v| v == "1" || v == "true");

        let mut tls = OutboundTlsConfig::with_fingerprint(
            params.get("sni").cloned().unwrap_or_else(|| host.clone()),
            params.get("utls_enabled").is_some_and(|v| v == "true"),
            params
                .get("fp")
                .cloned()
                .unwrap_or_else(|| "chrome".to_string()),
        );
        tls.insecure = Some(is_set("insecure") || is_set("allowInsecure"));
        tls.alpn = params
            .get("alpn")
            .map(|a| {
                a.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| vec!["h3".to_string()]);

        let obfs = params.get("obfs").map(|obfs_type| Hysteria2Obfs {
            obfs_type: obfs_type.clone(),
            password: first_param(&params, &["obfs-password", "obfs_password"])
                .unwrap_or_default()
                .to_string(),
        });

        Ok(Outbound::Hysteria2(Hysteria2Outbound {
            tag: sanitize_tag(Some(&remark)),
            server: host,
            server_port,
            password,
            up_mbps: bandwidth(&["upmbps", "up"], DEFAULT_UP_MBPS),
            down_mbps: bandwidth(&["downmbps", "down"], DEFAULT_DOWN_MBPS),
            tls,
            obfs,
        }))
    }
}
