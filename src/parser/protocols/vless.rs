//! VLESS protocol parser
//!
//! This module provides parsing for VLESS (vless://) links.
//! Format: vless://uuid@host:port?params#remark

use std::collections::{BTreeMap, HashMap};

use tracing::trace;
use url::Url;

use crate::config::outbound::{
    GrpcTransport, Outbound, StreamTransport, V2RayTransport, VLessOutbound, WebSocketTransport,
};
use crate::config::shared::{OutboundRealityConfig, OutboundTlsConfig};
use crate::error::{ConvertError, Result};
use crate::tag::sanitize_tag;

use super::{ProtocolParser, decoded_fragment, query_params, required_host};

// ============================================================================
// VLESS Parser
// ============================================================================

/// Parser for VLESS (vless://) links
///
/// Recognized query parameters: `security`, `encryption`, `type`, `sni`,
/// `host`, `fp`, `pbk`, `sid`, `flow`, `path`, `serviceName`.
pub struct VLessParser;

impl ProtocolParser for VLessParser {
    fn scheme(&self) -> &str {
        "vless"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        trace!("Parsing VLESS link");
        let url = Url::parse(link).map_err(|e| ConvertError::malformed("vless", e.to_string()))?;

        let uuid = url.username().to_string();
        if uuid.is_empty() {
            return Err(ConvertError::malformed("vless", "missing uuid"));
        }

        let host = required_host(&url, "vless")?;
        let params = query_params(&url);

        let security = params.get("security").map(String::as_str);
        let secured = matches!(security, Some("tls" | "reality"));

        let server_port = match url.port() {
            Some(port) if port > 0 => port,
            _ if secured => 443,
            _ => 80,
        };

        let remark = decoded_fragment(&url).unwrap_or_else(|| {
            let port = url.port().map_or("default".to_string(), |p| p.to_string());
            format!("vless_{}_{}", host, port)
        });

        let tls = secured.then(|| build_tls(&params, &host, security == Some("reality")));

        let encryption = (matches!(security, None | Some("none"))
            && params.get("encryption").is_some_and(|e| e == "none"))
        .then(|| "none".to_string());

        let flow = if secured {
            params.get("flow").cloned()
        } else {
            None
        };

        Ok(Outbound::VLess(VLessOutbound {
            tag: sanitize_tag(Some(&remark)),
            server: host.clone(),
            server_port,
            uuid,
            tls,
            encryption,
            flow,
            transport: build_transport(&params, &host),
        }))
    }
}

fn build_tls(params: &HashMap<String, String>, host: &str, reality: bool) -> OutboundTlsConfig {
    let server_name = params
        .get("sni")
        .or_else(|| params.get("host"))
        .cloned()
        .unwrap_or_else(|| host.to_string());
    let fingerprint = params
        .get("fp")
        .cloned()
        .unwrap_or_else(|| "chrome".to_string());

    let mut tls = OutboundTlsConfig::with_fingerprint(server_name, true, fingerprint);
    if reality {
        tls.reality = Some(OutboundRealityConfig {
            enabled: true,
            public_key: params.get("pbk").cloned(),
            short_id: params.get("sid").cloned().unwrap_or_default(),
        });
    }
    tls
}

fn build_transport(params: &HashMap<String, String>, host: &str) -> StreamTransport {
    let transport = match params.get("type").map(String::as_str) {
        None | Some("tcp") => return StreamTransport::Default,
        Some("ws") => V2RayTransport::WebSocket(WebSocketTransport {
            path: params.get("path").cloned().unwrap_or_else(|| "/".to_string()),
            headers: BTreeMap::from([(
                "Host".to_string(),
                params
                    .get("host")
                    .cloned()
                    .unwrap_or_else(|| host.to_string()),
            )]),
        }),
        Some("grpc") => V2RayTransport::Grpc(GrpcTransport {
            service_name: params.get("serviceName").cloned().unwrap_or_default(),
        }),
        Some(other) => V2RayTransport::Bare(other.to_string()),
    };
    transport.into()
}
