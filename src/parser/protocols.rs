//! Protocol parsers module
//!
//! Each share-link scheme has a parser implementing [`ProtocolParser`].
//! The [`ProtocolRegistry`] tries them in registration order.

mod hysteria2;
mod vless;
mod vmess;

pub use hysteria2::Hysteria2Parser;
pub use vless::VLessParser;
pub use vmess::VMessParser;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::config::outbound::Outbound;
use crate::error::{ConvertError, Result};

// ============================================================================
// Protocol Parser Trait
// ============================================================================

/// Trait for parsing individual share links
pub trait ProtocolParser: Send + Sync {
    /// The link scheme this parser handles (e.g. "vless", "hy2")
    fn scheme(&self) -> &str;

    /// Parses a link into an outbound
    fn parse(&self, link: &str) -> Result<Outbound>;

    /// Checks if this parser can handle the given link
    fn can_parse(&self, link: &str) -> bool {
        link.strip_prefix(self.scheme())
            .is_some_and(|rest| rest.starts_with("://"))
    }
}

// ============================================================================
// Protocol Registry
// ============================================================================

/// Ordered registry of protocol parsers
#[derive(Default)]
pub struct ProtocolRegistry {
    parsers: Vec<Arc<dyn ProtocolParser>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the vless, vmess, hysteria2 and hy2 parsers, in that order
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VLessParser));
        registry.register(Arc::new(VMessParser));
        registry.register(Arc::new(Hysteria2Parser::new("hysteria2")));
        registry.register(Arc::new(Hysteria2Parser::new("hy2")));
        registry
    }

    /// Appends a parser; earlier registrations win on overlapping prefixes
    pub fn register(&mut self, parser: Arc<dyn ProtocolParser>) {
        self.parsers.push(parser);
    }

    /// Registered schemes in dispatch order
    pub fn schemes(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.scheme()).collect()
    }

    /// Parses a link with the first parser that accepts its prefix
    pub fn parse_link(&self, link: &str) -> Result<Outbound> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.can_parse(link))
            .ok_or_else(|| ConvertError::unsupported(link))?;

        debug!("Parsing {} link", parser.scheme());
        let outbound = parser.parse(link)?;
        debug!(
            "Parsed {} link -> outbound '{}'",
            parser.scheme(),
            outbound.tag()
        );
        Ok(outbound)
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Query parameters with empty values dropped. The first occurrence of a
/// repeated key wins.
pub(crate) fn query_params(url: &Url) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url.query_pairs() {
        if !value.is_empty() {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    params
}

/// First present value among `keys`
pub(crate) fn first_param<'a>(params: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| params.get(*k).map(String::as_str))
}

/// Percent-decoded fragment, `None` when absent or empty
pub(crate) fn decoded_fragment(url: &Url) -> Option<String> {
    let fragment = url.fragment().filter(|f| !f.is_empty())?;
    let decoded = urlencoding::decode(fragment)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| fragment.to_string());
    Some(decoded).filter(|d| !d.is_empty())
}

/// Leading integer of a string: optional whitespace and `+`, then digits.
/// Returns `None` when no digits lead the string.
pub(crate) fn leading_u32(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

/// Host of a parsed link, required by every scheme
pub(crate) fn required_host(url: &Url, scheme: &'static str) -> Result<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConvertError::malformed(scheme, "missing host"))
}
