//! Config assembly
//!
//! Wraps parsed proxy outbounds in a complete client profile: scaffolding
//! outbounds, an automatic selector, DNS with per-resolver detours, TUN and
//! mixed listeners, and a fixed rule set that keeps Iranian destinations
//! and private ranges direct.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SingBoxConfig;
use crate::config::dns::{Dns, DnsRule, DnsServer};
use crate::config::experimental::{CacheFile, Experimental};
use crate::config::inbound::{Inbound, ListenFields, MixedInbound, TunInbound};
use crate::config::log::{Log, LogLevel};
use crate::config::outbound::{Outbound, UrlTestOutbound};
use crate::config::route::{Route, RouteRule};
use crate::config::shared::DomainStrategy;

pub const DIRECT_TAG: &str = "direct";
pub const BLOCK_TAG: &str = "block";
pub const DNS_OUT_TAG: &str = "dns-out";
pub const AUTO_SELECT_TAG: &str = "auto_select_proxies";

// ============================================================================
// Assembly Profile
// ============================================================================

/// Tunable constants of the generated profile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AssemblyProfile {
    /// Name of the TUN interface
    pub tun_interface_name: String,

    /// IPv4 prefix of the TUN interface
    pub tun_inet4_address: String,

    /// Address of the local mixed proxy listener
    pub mixed_listen: String,

    pub mixed_listen_port: u16,

    /// URL probed by the automatic selector
    pub probe_url: String,

    pub probe_interval: String,

    /// Milliseconds of latency difference tolerated before switching
    pub probe_tolerance: u16,
}

impl Default for AssemblyProfile {
    fn default() -> Self {
        Self {
            tun_interface_name: "NotePadVPN-TUN".to_string(),
            tun_inet4_address: "172.19.0.1/28".to_string(),
            mixed_listen: "127.0.0.1".to_string(),
            mixed_listen_port: 2080,
            probe_url: "http://www.gstatic.com/generate_204".to_string(),
            probe_interval: "10m".to_string(),
            probe_tolerance: 200,
        }
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Builds configuration documents from proxy outbounds
#[derive(Clone, Debug, Default)]
pub struct ConfigAssembler {
    profile: AssemblyProfile,
}

/// Run-scoped tag bookkeeping
struct TagRegistry {
    seen: HashSet<String>,
    counter: u32,
}

impl TagRegistry {
    fn with_reserved(reserved: &[&str]) -> Self {
        Self {
            seen: reserved.iter().map(|t| t.to_string()).collect(),
            counter: 1,
        }
    }

    /// Returns `base` or, on collision, `base_<n>` with the first free value
    /// of the shared counter, and reserves the result.
    fn claim(&mut self, base: &str) -> String {
        let mut tag = base.to_string();
        while self.seen.contains(&tag) {
            tag = format!("{}_{}", base, self.counter);
            self.counter += 1;
        }
        self.seen.insert(tag.clone());
        tag
    }

    fn contains(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }
}

impl ConfigAssembler {
    pub fn new(profile: AssemblyProfile) -> Self {
        Self { profile }
    }

    /// Assembles a complete document around `proxies`, renaming colliding
    /// tags. Never fails; zero proxies yields a direct-only profile.
    pub fn assemble(&self, proxies: Vec<Outbound>) -> SingBoxConfig {
        let mut tags = TagRegistry::with_reserved(&[DIRECT_TAG, BLOCK_TAG, DNS_OUT_TAG]);

        let mut outbounds = vec![
            Outbound::direct(DIRECT_TAG),
            Outbound::block(BLOCK_TAG),
            Outbound::dns(DNS_OUT_TAG),
        ];

        let mut proxy_tags = Vec::with_capacity(proxies.len());
        for mut outbound in proxies {
            let tag = tags.claim(outbound.tag());
            if tag != outbound.tag() {
                debug!("Renamed duplicate tag '{}' to '{}'", outbound.tag(), tag);
                outbound.set_tag(tag.clone());
            }
            proxy_tags.push(tag);
            outbounds.push(outbound);
        }

        let final_tag = match proxy_tags.as_slice() {
            [] => DIRECT_TAG.to_string(),
            [only] => only.clone(),
            _ => {
                let selector_tag = tags.claim(AUTO_SELECT_TAG);
                outbounds.push(Outbound::UrlTest(UrlTestOutbound {
                    tag: selector_tag.clone(),
                    outbounds: proxy_tags.clone(),
                    url: self.profile.probe_url.clone(),
                    interval: self.profile.probe_interval.clone(),
                    tolerance: self.profile.probe_tolerance,
                }));
                selector_tag
            }
        };

        let dns_detour = if final_tag != DIRECT_TAG && tags.contains(&final_tag) {
            final_tag.as_str()
        } else {
            DIRECT_TAG
        };

        info!(
            "Assembled config with {} proxies, final outbound '{}'",
            proxy_tags.len(),
            final_tag
        );

        SingBoxConfig {
            log: Log::new(LogLevel::Info, true),
            dns: build_dns(dns_detour),
            inbounds: self.build_inbounds(),
            outbounds,
            route: build_route(final_tag.clone()),
            experimental: Experimental {
                cache_file: Some(CacheFile {
                    enabled: true,
                    path: None,
                }),
            },
        }
    }

    fn build_inbounds(&self) -> Vec<Inbound> {
        vec![
            Inbound::Tun(TunInbound {
                tag: "tun-in".to_string(),
                interface_name: Some(self.profile.tun_interface_name.clone()),
                inet4_address: Some(self.profile.tun_inet4_address.clone()),
                auto_route: true,
                strict_route: true,
                stack: Some("mixed".to_string()),
                listen: ListenFields {
                    sniff: true,
                    ..Default::default()
                },
            }),
            Inbound::Mixed(MixedInbound {
                tag: "mixed-proxy-in".to_string(),
                listen: ListenFields {
                    listen: Some(self.profile.mixed_listen.clone()),
                    listen_port: Some(self.profile.mixed_listen_port),
                    sniff: true,
                },
            }),
        ]
    }
}

/// Convenience wrapper using the default profile
pub fn assemble(proxies: Vec<Outbound>) -> SingBoxConfig {
    ConfigAssembler::default().assemble(proxies)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Remote resolvers go through `detour`; regional and system resolvers
/// always go direct.
fn build_dns(detour: &str) -> Dns {
    Dns {
        servers: vec![
            DnsServer::new("tls://1.1.1.1", "dns_cf_tls", detour),
            DnsServer::new("https://dns.google/dns-query", "dns_google_doh", detour),
            DnsServer::new("1.0.0.1", "dns_cf_plain_backup", detour),
            DnsServer::new("223.5.5.5", "dns_ali", DIRECT_TAG),
            DnsServer::new("185.51.200.2", "dns_shecan", DIRECT_TAG),
            DnsServer::new("local", "dns_system", DIRECT_TAG),
        ],
        rules: vec![
            DnsRule {
                geosite: strings(&["category-ir"]),
                server: "dns_ali".to_string(),
                ..Default::default()
            },
            DnsRule {
                domain_suffix: strings(&[".ir"]),
                server: "dns_ali".to_string(),
                ..Default::default()
            },
            DnsRule {
                query_type: strings(&["A", "AAAA"]),
                server: "dns_cf_tls".to_string(),
                rewrite_ttl: Some(300),
                ..Default::default()
            },
            DnsRule {
                server: "dns_system".to_string(),
                ..Default::default()
            },
        ],
        strategy: Some(DomainStrategy::Ipv4Only),
        disable_cache: false,
    }
}

fn build_route(final_tag: String) -> Route {
    Route {
        rules: vec![
            RouteRule {
                protocol: strings(&["dns"]),
                ..RouteRule::to(DNS_OUT_TAG)
            },
            RouteRule {
                domain: strings(&["allatori.com", "analytics.example.com"]),
                ..RouteRule::to(BLOCK_TAG)
            },
            RouteRule {
                domain_keyword: strings(&["ads", "tracker"]),
                ..RouteRule::to(BLOCK_TAG)
            },
            RouteRule {
                domain_suffix: strings(&[
                    ".ir",
                    "arvancloud.ir",
                    "arvancloud.com",
                    "cdn.ir",
                    "shaparak.ir",
                    "digikala.com",
                ]),
                ..RouteRule::to(DIRECT_TAG)
            },
            RouteRule {
                geosite: strings(&["category-ir"]),
                ..RouteRule::to(DIRECT_TAG)
            },
            RouteRule {
                geoip: strings(&["ir"]),
                ..RouteRule::to(DIRECT_TAG)
            },
            RouteRule {
                ip_cidr: strings(&["192.168.0.0/16", "10.0.0.0/8", "172.16.0.0/12"]),
                ..RouteRule::to(DIRECT_TAG)
            },
            RouteRule {
                domain: strings(&["localhost"]),
                ..RouteRule::to(DIRECT_TAG)
            },
        ],
        final_outbound: Some(final_tag),
        auto_detect_interface: true,
        override_android_vpn: true,
    }
}
