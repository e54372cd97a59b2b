//! VMess protocol parser
//!
//! VMess links carry a Base64 encoded JSON object:
//! vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, ... })

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::config::outbound::{
    GrpcTransport, H2Transport, Outbound, StreamTransport, V2RayTransport, VMessOutbound,
    WebSocketTransport,
};
use crate::config::shared::{OutboundRealityConfig, OutboundTlsConfig};
use crate::error::{ConvertError, Result};
use crate::parser::base64::decode_base64_text;
use crate::tag::sanitize_tag;

use super::{ProtocolParser, leading_u32};

// ============================================================================
// VMess Parser
// ============================================================================

/// Parser for VMess (vmess://) links
pub struct VMessParser;

/// VMess link JSON. Every field may be a string or a number in the wild;
/// empty strings are read as absent.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct VMessJson {
    #[serde(deserialize_with = "lenient_string")]
    ps: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    add: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    port: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    aid: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    scy: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    security: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    net: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    tls: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    sni: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    fp: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pbk: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    sid: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    host: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    path: Option<String>,
    #[serde(rename = "serviceName", deserialize_with = "lenient_string")]
    service_name: Option<String>,
}

impl ProtocolParser for VMessParser {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn parse(&self, link: &str) -> Result<Outbound> {
        trace!("Parsing VMess link");
        let payload = link.strip_prefix("vmess://").unwrap_or(link);

        let decoded =
            decode_base64_text(payload).map_err(|e| ConvertError::invalid_link(link, e.to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&decoded)
            .map_err(|e| ConvertError::invalid_link(link, format!("invalid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(ConvertError::invalid_link(link, "payload is not a JSON object"));
        }
        let json: VMessJson = serde_json::from_value(value)
            .map_err(|e| ConvertError::invalid_link(link, format!("invalid JSON: {}", e)))?;

        let server = json
            .add
            .clone()
            .ok_or_else(|| ConvertError::malformed("vmess", "missing server address (add)"))?;

        let port_text = json
            .port
            .clone()
            .ok_or_else(|| ConvertError::malformed("vmess", "missing port"))?;
        let server_port = leading_u32(&port_text)
            .and_then(|p| u16::try_from(p).ok())
            .filter(|p| *p > 0)
            .ok_or_else(|| {
                ConvertError::malformed("vmess", format!("invalid port '{}'", port_text))
            })?;

        let uuid = json
            .id
            .clone()
            .ok_or_else(|| ConvertError::malformed("vmess", "missing user id"))?;

        let remark = json
            .ps
            .clone()
            .unwrap_or_else(|| format!("vmess_{}_{}", server, port_text));

        Ok(Outbound::VMess(VMessOutbound {
            tag: sanitize_tag(Some(&remark)),
            alter_id: json.aid.as_deref().and_then(leading_u32).unwrap_or(0),
            security: json
                .scy
                .clone()
                .or_else(|| json.security.clone())
                .unwrap_or_else(|| "auto".to_string()),
            tls: build_tls(&json, &server),
            transport: build_transport(&json, &server),
            server,
            server_port,
            uuid,
        }))
    }
}

/// TLS is on for `tls`/`reality`, and also for ws/h2 links that name a
/// host or SNI.
fn build_tls(json: &VMessJson, server: &str) -> Option<OutboundTlsConfig> {
    let tls_mode = json.tls.as_deref();
    let named_stream = matches!(json.net.as_deref(), Some("ws" | "h2"))
        && (json.host.is_some() || json.sni.is_some());

    if !matches!(tls_mode, Some("tls" | "reality")) && !named_stream {
        return None;
    }

    let server_name = json
        .sni
        .clone()
        .or_else(|| json.host.clone())
        .unwrap_or_else(|| server.to_string());
    let fingerprint = json.fp.clone().unwrap_or_else(|| "chrome".to_string());

    let mut tls = OutboundTlsConfig::with_fingerprint(server_name, true, fingerprint);
    if tls_mode == Some("reality") {
        tls.reality = Some(OutboundRealityConfig {
            enabled: true,
            public_key: json.pbk.clone(),
            short_id: json.sid.clone().unwrap_or_default(),
        });
    }
    Some(tls)
}

fn build_transport(json: &VMessJson, server: &str) -> StreamTransport {
    let host = || json.host.clone().unwrap_or_else(|| server.to_string());
    let path = || json.path.clone().unwrap_or_else(|| "/".to_string());

    let transport = match json.net.as_deref() {
        None | Some("tcp") => return StreamTransport::Default,
        Some("ws") => V2RayTransport::WebSocket(WebSocketTransport {
            path: path(),
            headers: BTreeMap::from([("Host".to_string(), host())]),
        }),
        Some("grpc") => V2RayTransport::Grpc(GrpcTransport {
            service_name: json
                .service_name
                .clone()
                .or_else(|| json.path.clone())
                .unwrap_or_default(),
        }),
        Some("h2") => V2RayTransport::H2(H2Transport {
            path: path(),
            host: vec![host()],
        }),
        Some(other) => V2RayTransport::Bare(other.to_string()),
    };
    transport.into()
}

/// Reads strings, numbers and booleans as text; null and "" as `None`
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
