use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::shared::OutboundTlsConfig;

// ============================================================================
// Outbound Enum
// ============================================================================

/// Outbound configuration enum
///
/// Proxy variants are produced by the link parsers; the rest is scaffolding
/// added by the assembler.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    /// Send requests directly
    Direct(DirectOutbound),
    /// Drop requests
    Block(BlockOutbound),
    /// Hand requests to the internal DNS server
    Dns(DnsOutbound),
    #[serde(rename = "vless")]
    VLess(VLessOutbound),
    #[serde(rename = "vmess")]
    VMess(VMessOutbound),
    Hysteria2(Hysteria2Outbound),
    /// Latency-probing automatic selector
    #[serde(rename = "urltest")]
    UrlTest(UrlTestOutbound),
}

impl Outbound {
    pub fn tag(&self) -> &str {
        match self {
            Outbound::Direct(o) => &o.tag,
            Outbound::Block(o) => &o.tag,
            Outbound::Dns(o) => &o.tag,
            Outbound::VLess(o) => &o.tag,
            Outbound::VMess(o) => &o.tag,
            Outbound::Hysteria2(o) => &o.tag,
            Outbound::UrlTest(o) => &o.tag,
        }
    }

    pub fn set_tag(&mut self, tag: String) {
        match self {
            Outbound::Direct(o) => o.tag = tag,
            Outbound::Block(o) => o.tag = tag,
            Outbound::Dns(o) => o.tag = tag,
            Outbound::VLess(o) => o.tag = tag,
            Outbound::VMess(o) => o.tag = tag,
            Outbound::Hysteria2(o) => o.tag = tag,
            Outbound::UrlTest(o) => o.tag = tag,
        }
    }

    /// Whether this outbound is a remote proxy rather than scaffolding
    pub fn is_proxy(&self) -> bool {
        matches!(
            self,
            Outbound::VLess(_) | Outbound::VMess(_) | Outbound::Hysteria2(_)
        )
    }

    /// The `type` value as written in the document
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Direct(_) => "direct",
            Outbound::Block(_) => "block",
            Outbound::Dns(_) => "dns",
            Outbound::VLess(_) => "vless",
            Outbound::VMess(_) => "vmess",
            Outbound::Hysteria2(_) => "hysteria2",
            Outbound::UrlTest(_) => "urltest",
        }
    }

    pub fn direct(tag: &str) -> Self {
        Outbound::Direct(DirectOutbound {
            tag: tag.to_string(),
        })
    }

    pub fn block(tag: &str) -> Self {
        Outbound::Block(BlockOutbound {
            tag: tag.to_string(),
        })
    }

    pub fn dns(tag: &str) -> Self {
        Outbound::Dns(DnsOutbound {
            tag: tag.to_string(),
        })
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Stream transport of a proxy outbound
///
/// `Default` is the implicit plain TCP stream and is never written to the
/// document; use with
/// `#[serde(default, skip_serializing_if = "StreamTransport::is_default")]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StreamTransport {
    #[default]
    Default,
    Explicit(V2RayTransport),
}

impl StreamTransport {
    pub fn is_default(&self) -> bool {
        matches!(self, StreamTransport::Default)
    }

    pub fn explicit(&self) -> Option<&V2RayTransport> {
        match self {
            StreamTransport::Default => None,
            StreamTransport::Explicit(t) => Some(t),
        }
    }
}

impl From<V2RayTransport> for StreamTransport {
    fn from(transport: V2RayTransport) -> Self {
        StreamTransport::Explicit(transport)
    }
}

impl Serialize for StreamTransport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            StreamTransport::Default => serializer.serialize_none(),
            StreamTransport::Explicit(t) => t.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StreamTransport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<V2RayTransport>::deserialize(deserializer)? {
            Some(t) => StreamTransport::Explicit(t),
            None => StreamTransport::Default,
        })
    }
}

/// V2Ray transport block
///
/// Known types carry their parameters; any other type is kept as a bare
/// `{"type": ...}` object.
#[derive(Clone, Debug, PartialEq)]
pub enum V2RayTransport {
    WebSocket(WebSocketTransport),
    Grpc(GrpcTransport),
    H2(H2Transport),
    Bare(String),
}

impl V2RayTransport {
    pub fn kind(&self) -> &str {
        match self {
            V2RayTransport::WebSocket(_) => "ws",
            V2RayTransport::Grpc(_) => "grpc",
            V2RayTransport::H2(_) => "h2",
            V2RayTransport::Bare(kind) => kind,
        }
    }
}

impl Serialize for V2RayTransport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(tag = "type")]
        enum TransportTagged<'a> {
            #[serde(rename = "ws")]
            WebSocket(&'a WebSocketTransport),
            #[serde(rename = "grpc")]
            Grpc(&'a GrpcTransport),
            #[serde(rename = "h2")]
            H2(&'a H2Transport),
        }

        #[derive(Serialize)]
        struct BareTransport<'a> {
            #[serde(rename = "type")]
            kind: &'a str,
        }

        match self {
            V2RayTransport::WebSocket(t) => TransportTagged::WebSocket(t).serialize(serializer),
            V2RayTransport::Grpc(t) => TransportTagged::Grpc(t).serialize(serializer),
            V2RayTransport::H2(t) => TransportTagged::H2(t).serialize(serializer),
            V2RayTransport::Bare(kind) => BareTransport { kind }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for V2RayTransport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(tag = "type")]
        enum TransportInner {
            #[serde(rename = "ws")]
            WebSocket(WebSocketTransport),
            #[serde(rename = "grpc")]
            Grpc(GrpcTransport),
            #[serde(rename = "h2")]
            H2(H2Transport),
        }

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::custom("transport is missing a string `type`"))?
            .to_string();

        match kind.as_str() {
            "ws" | "grpc" | "h2" => {
                let inner: TransportInner =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok(match inner {
                    TransportInner::WebSocket(t) => V2RayTransport::WebSocket(t),
                    TransportInner::Grpc(t) => V2RayTransport::Grpc(t),
                    TransportInner::H2(t) => V2RayTransport::H2(t),
                })
            }
            _ => Ok(V2RayTransport::Bare(kind)),
        }
    }
}

/// WebSocket transport
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WebSocketTransport {
    pub path: String,

    /// Extra headers, `Host` in practice
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// gRPC transport
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GrpcTransport {
    #[serde(default)]
    pub service_name: String,
}

/// HTTP/2 transport; `host` is always a list
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct H2Transport {
    pub path: String,

    #[serde(default)]
    pub host: Vec<String>,
}

// ============================================================================
// Scaffolding Outbounds
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DirectOutbound {
    pub tag: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlockOutbound {
    pub tag: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DnsOutbound {
    pub tag: String,
}

/// URLTest outbound (automatic selection)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UrlTestOutbound {
    pub tag: String,

    /// Candidate outbound tags
    pub outbounds: Vec<String>,

    /// Probe URL
    pub url: String,

    /// Probe interval, e.g. "10m"
    pub interval: String,

    /// Latency difference in milliseconds tolerated before switching
    pub tolerance: u16,
}

// ============================================================================
// Proxy Outbounds
// ============================================================================

/// VLESS outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VLessOutbound {
    pub tag: String,
    pub server: String,
    pub server_port: u16,
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    /// Only ever `"none"`, and only for plain links that ask for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,

    /// e.g. `xtls-rprx-vision`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,

    #[serde(default, skip_serializing_if = "StreamTransport::is_default")]
    pub transport: StreamTransport,
}

/// VMess outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VMessOutbound {
    pub tag: String,
    pub server: String,
    pub server_port: u16,
    pub uuid: String,

    /// Always written, 0 for AEAD
    #[serde(default)]
    pub alter_id: u32,

    /// Encryption method, "auto" unless the link says otherwise
    pub security: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutboundTlsConfig>,

    #[serde(default, skip_serializing_if = "StreamTransport::is_default")]
    pub transport: StreamTransport,
}

/// Hysteria2 outbound
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Hysteria2Outbound {
    pub tag: String,
    pub server: String,
    pub server_port: u16,
    pub password: String,
    pub up_mbps: u32,
    pub down_mbps: u32,

    /// Hysteria2 always runs over TLS
    pub tls: OutboundTlsConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<Hysteria2Obfs>,
}

/// Hysteria2 obfuscation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Hysteria2Obfs {
    /// Obfuscation type, `salamander` in practice
    #[serde(rename = "type")]
    pub obfs_type: String,

    pub password: String,
}
