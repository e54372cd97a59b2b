use serde::{Deserialize, Serialize};

use crate::config::dns::Dns;
use crate::config::experimental::Experimental;
use crate::config::inbound::Inbound;
use crate::config::log::Log;
use crate::config::outbound::Outbound;
use crate::config::route::Route;

pub mod dns;
pub mod experimental;
pub mod inbound;
pub mod log;
pub mod outbound;
pub mod route;
pub mod shared;
pub mod util;

/// Generated sing-box client configuration
///
/// One value per conversion run. Every top-level section is always present,
/// so the document serializes with exactly the keys `log`, `dns`,
/// `inbounds`, `outbounds`, `route` and `experimental`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SingBoxConfig {
    pub log: Log,
    pub dns: Dns,
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
    pub route: Route,
    pub experimental: Experimental,
}

impl SingBoxConfig {
    /// Pretty JSON, the form written to disk and stdout
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Tags of all outbounds in document order
    pub fn outbound_tags(&self) -> Vec<&str> {
        self.outbounds.iter().map(Outbound::tag).collect()
    }

    /// Outbounds that came from share links, in document order
    pub fn proxies(&self) -> impl Iterator<Item = &Outbound> {
        self.outbounds.iter().filter(|o| o.is_proxy())
    }
}
