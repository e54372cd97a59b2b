//! Share-link parsing
//!
//! This module turns single share links into sing-box outbounds:
//! - `vless://uuid@host:port?params#remark`
//! - `vmess://BASE64(JSON)`
//! - `hysteria2://password@host:port?params#remark` (alias `hy2://`)
//!
//! Parsing is pure: no I/O, one line in, one outbound or one classified
//! error out.

pub mod base64;
pub mod protocols;

pub use protocols::{Hysteria2Parser, ProtocolParser, ProtocolRegistry, VLessParser, VMessParser};

use once_cell::sync::Lazy;

use crate::config::outbound::Outbound;
use crate::error::Result;

static BUILTIN: Lazy<ProtocolRegistry> = Lazy::new(ProtocolRegistry::with_builtin_parsers);

/// Parses one trimmed share link with the built-in parsers.
///
/// Prefixes are checked case-sensitively in the order `vless://`,
/// `vmess://`, `hysteria2://`, `hy2://`.
pub fn parse_link(link: &str) -> Result<Outbound> {
    BUILTIN.parse_link(link)
}

/// Whether the line is a subscription URL rather than a share link
pub fn is_subscription_url(line: &str) -> bool {
    line.starts_with("http://") || line.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    #[test]
    fn test_dispatch_by_prefix() {
        let o = parse_link("vless://id@a.com:443?security=tls#A").unwrap();
        assert_eq!(o.kind(), "vless");
        let o = parse_link("hy2://pw@b.com:8443#B").unwrap();
        assert_eq!(o.kind(), "hysteria2");
        let o = parse_link("hysteria2://pw@b.com:8443#B").unwrap();
        assert_eq!(o.kind(), "hysteria2");
    }

    #[test]
    fn test_unknown_scheme() {
        let err = parse_link("trojan://password@example.com:443#very-long-remark").unwrap_err();
        let ConvertError::UnsupportedScheme { prefix } = err else {
            panic!("Expected UnsupportedScheme");
        };
        assert_eq!(prefix, "trojan://password@example.com:");
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(matches!(
            parse_link("VLESS://id@a.com:443"),
            Err(ConvertError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_subscription_detection() {
        assert!(is_subscription_url("https://example.com/sub"));
        assert!(is_subscription_url("http://example.com/sub"));
        assert!(!is_subscription_url("vless://id@a.com:443"));
        assert!(!is_subscription_url("ftp://example.com/sub"));
    }
}
