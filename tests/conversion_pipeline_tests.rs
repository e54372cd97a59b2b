//! End-to-end tests for the link-to-config pipeline.
//!
//! Subscriptions are served by a scripted fetcher so no test touches the
//! network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use boxlink::config::outbound::{Outbound, V2RayTransport};
use boxlink::error::{ConvertError, Result};
use boxlink::generator::{Converter, FetchResponse, SubscriptionFetcher};
use boxlink::parser::parse_link;
use boxlink::tag::is_valid_tag;

// ============================================================================
// Helpers
// ============================================================================

/// Serves canned responses per URL and records every request
#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, FetchResponse>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn with(mut self, url: &str, response: FetchResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requested.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| ConvertError::SubscriptionFetch {
                url: url.to_string(),
                detail: "connection refused".to_string(),
            })
    }
}

fn vmess_link(json: &serde_json::Value) -> String {
    format!("vmess://{}", STANDARD.encode(json.to_string()))
}

// ============================================================================
// Single Link Examples
// ============================================================================

#[test]
fn test_vless_ws_tls_example() {
    let outbound = parse_link(
        "vless://uuid@host:443?security=tls&sni=example.com&type=ws&path=/ws&host=example.com#MyNode",
    )
    .unwrap();
    let json = serde_json::to_value(&outbound).unwrap();
    assert_eq!(json["type"], "vless");
    assert_eq!(json["tag"], "MyNode");
    assert_eq!(json["server"], "host");
    assert_eq!(json["server_port"], 443);
    assert_eq!(json["uuid"], "uuid");
    assert_eq!(json["tls"]["enabled"], true);
    assert_eq!(json["tls"]["server_name"], "example.com");
    assert_eq!(
        json["transport"],
        json!({"type": "ws", "path": "/ws", "headers": {"Host": "example.com"}})
    );
}

#[test]
fn test_tags_satisfy_invariant_for_every_scheme() {
    let links = [
        "vless://id@a.com:443#🔥 Fast | HK [01] (premium)".to_string(),
        "hy2://p@b.com:8443#«Frankfurt» \\ node?".to_string(),
        vmess_link(&json!({"ps": "🇯🇵 Tokyo, Japan!!", "add": "c.com", "port": 443, "id": "u"})),
        format!("vless://id@d.com:443#{}", "x".repeat(80)),
        "vless://id@e.com:443#🚀".to_string(),
    ];
    for link in links {
        let outbound = parse_link(&link).unwrap();
        assert!(
            is_valid_tag(outbound.tag()),
            "invalid tag {:?} for {}",
            outbound.tag(),
            link
        );
    }
}

#[test]
fn test_transport_block_omission() {
    for link in [
        "vless://id@a.com:443?type=tcp#A",
        "vless://id@a.com:443#A",
    ] {
        let json = serde_json::to_value(parse_link(link).unwrap()).unwrap();
        assert!(json.get("transport").is_none(), "{}", link);
    }
    let Outbound::VLess(v) = parse_link("vless://id@a.com:443?type=ws#A").unwrap() else {
        panic!("Expected VLess outbound");
    };
    assert!(matches!(
        v.transport.explicit(),
        Some(V2RayTransport::WebSocket(_))
    ));
}

// ============================================================================
// Batch Conversion
// ============================================================================

#[tokio::test]
async fn test_invalid_vmess_does_not_stop_batch() {
    let converter = Converter::new(ScriptedFetcher::default());
    let input = "vmess://%%%%not-base64%%%%\nvless://id@a.com:443?security=tls#After";
    let conversion = converter.convert(input).await.unwrap();

    assert_eq!(conversion.failures.len(), 1);
    let ConvertError::InvalidLink { prefix, .. } = &conversion.failures[0].error else {
        panic!("Expected InvalidLink");
    };
    assert_eq!(prefix, "vmess://%%%%not-base64%%%");
    assert_eq!(
        conversion.config.route.final_outbound.as_deref(),
        Some("After")
    );
}

#[tokio::test]
async fn test_mixed_input_with_subscription() {
    let sub_body = STANDARD.encode(
        [
            "vless://id@s1.example.com:443?security=reality&pbk=K#Shared",
            "garbage line",
            "hysteria2://pw@s2.example.com:443#Shared",
        ]
        .join("\n"),
    );
    let fetcher = ScriptedFetcher::default().with(
        "https://sub.example.com/token",
        FetchResponse::ok(sub_body),
    );
    let converter = Converter::new(fetcher);

    let input = r#"
        vless://id@first.example.com:443#Shared

        https://sub.example.com/token
        https://down.example.com/sub
        hy2://pw@last.example.com:8443
    "#;
    let conversion = converter.convert(input).await.unwrap();
    let config = &conversion.config;

    let tags: Vec<&str> = config.proxies().map(Outbound::tag).collect();
    assert_eq!(
        tags,
        vec!["Shared", "Shared_1", "Shared_2", "hy2_last_example_com_8443"]
    );

    let Some(Outbound::UrlTest(urltest)) = config.outbounds.last() else {
        panic!("Expected urltest outbound");
    };
    assert_eq!(urltest.outbounds, tags);
    assert_eq!(
        config.route.final_outbound.as_deref(),
        Some("auto_select_proxies")
    );

    // only the unreachable subscription failed; bad lines inside a
    // subscription are skipped silently
    assert_eq!(conversion.failures.len(), 1);
    assert_eq!(conversion.failures[0].line, "https://down.example.com/sub");
}

#[tokio::test]
async fn test_subscriptions_fetched_in_order() {
    let body = STANDARD.encode("vless://id@a.com:443#A");
    let fetcher = ScriptedFetcher::default()
        .with("https://one.example.com", FetchResponse::ok(body.clone()))
        .with("https://two.example.com", FetchResponse::ok(body));
    let converter = Converter::new(fetcher);
    let report = converter
        .collect("https://one.example.com\nhttps://two.example.com")
        .await
        .unwrap();
    assert_eq!(report.outbounds.len(), 2);
}

#[tokio::test]
async fn test_fetcher_sees_each_subscription_once() {
    let fetcher = std::sync::Arc::new(ScriptedFetcher::default());
    let converter = Converter::new(std::sync::Arc::clone(&fetcher));
    let _ = converter
        .collect("https://a.example.com\nvless://id@a.com:443\nhttps://b.example.com")
        .await
        .unwrap();
    assert_eq!(
        fetcher.requested(),
        vec!["https://a.example.com", "https://b.example.com"]
    );
}

#[tokio::test]
async fn test_whitespace_input_is_empty() {
    let converter = Converter::new(ScriptedFetcher::default());
    assert!(matches!(
        converter.convert("\n   \n\t").await,
        Err(ConvertError::EmptyInput)
    ));
}

#[tokio::test]
async fn test_only_unsupported_links() {
    let converter = Converter::new(ScriptedFetcher::default());
    let err = converter
        .convert("ss://YWVzLTI1Ni1nY206cGFzcw@a.com:8388\ntrojan://pw@b.com:443")
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::NothingConvertible));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_document_top_level_keys() {
    let converter = Converter::new(ScriptedFetcher::default());
    let conversion = converter
        .convert("hy2://pw@a.com:443#A")
        .await
        .unwrap();
    let json = serde_json::to_value(&conversion.config).unwrap();
    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["dns", "experimental", "inbounds", "log", "outbounds", "route"]
    );
    assert_eq!(json["dns"]["servers"][0]["detour"], "A");
    assert_eq!(json["dns"]["servers"][5]["detour"], "direct");
}
