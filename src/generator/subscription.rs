//! Subscription resolving
//!
//! A subscription URL points at a base64 blob of newline separated share
//! links. Fetching goes through a [`SubscriptionFetcher`] so the pipeline
//! can run against a relay, a direct HTTP client, or a scripted fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::outbound::Outbound;
use crate::error::{ConvertError, Result, char_prefix};
use crate::get_version;
use crate::parser::ProtocolRegistry;
use crate::parser::base64::decode_base64_text;

/// Default CORS-style relay wrapping remote bodies in `{"contents": ...}`
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.allorigins.win/get";

// ============================================================================
// Fetch Collaborator
// ============================================================================

/// Response of a subscription fetch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    /// Body of the subscription, `None` when the relay returned nothing
    pub contents: Option<String>,
}

impl FetchResponse {
    /// Successful response carrying `contents`
    pub fn ok(contents: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            contents: Some(contents.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches subscription bodies
#[async_trait]
pub trait SubscriptionFetcher: Send + Sync {
    /// Fetches `url`. Transport failures are errors; HTTP failures are
    /// reported through [`FetchResponse::status`].
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

#[async_trait]
impl<T: SubscriptionFetcher + ?Sized> SubscriptionFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        (**self).fetch(url).await
    }
}

// ============================================================================
// HTTP Fetcher
// ============================================================================

/// How the HTTP fetcher reaches a subscription
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Through the relay endpoint, which answers with a JSON wrapper
    #[default]
    Relay,
    /// Straight from the subscription server
    Direct,
}

/// JSON wrapper returned by the relay
#[derive(Deserialize, Debug)]
struct RelayPayload {
    #[serde(default)]
    contents: Option<String>,
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
    mode: FetchMode,
    relay_endpoint: String,
}

impl HttpFetcher {
    /// Creates a fetcher; `timeout` bounds each request when set.
    pub fn new(mode: FetchMode, relay_endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(format!("boxlink/{}", get_version()));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            mode,
            relay_endpoint: relay_endpoint.to_string(),
        })
    }

    /// URL actually requested for `url` in the configured mode
    pub fn request_url(&self, url: &str) -> String {
        match self.mode {
            FetchMode::Relay => format!(
                "{}?url={}",
                self.relay_endpoint,
                urlencoding::encode(url)
            ),
            FetchMode::Direct => url.to_string(),
        }
    }
}

#[async_trait]
impl SubscriptionFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let request_url = self.request_url(url);
        debug!("Fetching subscription via {}", request_url);

        let fetch_error = |e: reqwest::Error| ConvertError::SubscriptionFetch {
            url: url.to_string(),
            detail: e.to_string(),
        };

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        let body = response.text().await.map_err(fetch_error)?;
        into_fetch_response(url, self.mode, status, body)
    }
}

/// Maps a raw HTTP reply to a [`FetchResponse`].
///
/// In relay mode the body is the relay's JSON wrapper. Unparseable JSON is
/// an error on success statuses and is ignored otherwise, leaving the
/// status text as the only detail.
fn into_fetch_response(
    url: &str,
    mode: FetchMode,
    status: reqwest::StatusCode,
    body: String,
) -> Result<FetchResponse> {
    let status_text = status.canonical_reason().unwrap_or_default().to_string();

    let contents = match mode {
        FetchMode::Direct => Some(body),
        FetchMode::Relay => match serde_json::from_str::<RelayPayload>(&body) {
            Ok(payload) => payload.contents,
            Err(e) if status.is_success() => {
                return Err(ConvertError::SubscriptionFetch {
                    url: url.to_string(),
                    detail: format!("relay returned invalid JSON: {}", e),
                });
            }
            Err(_) => None,
        },
    };

    Ok(FetchResponse {
        status: status.as_u16(),
        status_text,
        contents,
    })
}

// ============================================================================
// Resolver
// ============================================================================

/// Turns subscription URLs into outbounds
pub struct SubscriptionResolver<F> {
    fetcher: F,
    registry: Arc<ProtocolRegistry>,
}

impl<F: SubscriptionFetcher> SubscriptionResolver<F> {
    pub fn new(fetcher: F, registry: Arc<ProtocolRegistry>) -> Self {
        Self { fetcher, registry }
    }

    /// Fetches and parses one subscription. Lines that fail to parse are
    /// logged and skipped.
    pub async fn resolve(&self, url: &str) -> Result<Vec<Outbound>> {
        info!("Fetching subscription: {}", url);
        let response = self.fetcher.fetch(url).await?;

        if !response.is_success() {
            let detail = response
                .contents
                .filter(|c| !c.is_empty())
                .unwrap_or(response.status_text);
            return Err(ConvertError::SubscriptionFetch {
                url: url.to_string(),
                detail: format!("{} - {}", response.status, detail),
            });
        }

        let contents = response
            .contents
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ConvertError::SubscriptionFetch {
                url: url.to_string(),
                detail: "relay did not return content".to_string(),
            })?;

        let outbounds = parse_subscription_body(url, &contents, &self.registry)?;
        info!("Subscription {} yielded {} outbounds", url, outbounds.len());
        Ok(outbounds)
    }
}

/// Decodes a base64 subscription body and parses every non-empty line
pub fn parse_subscription_body(
    url: &str,
    contents: &str,
    registry: &ProtocolRegistry,
) -> Result<Vec<Outbound>> {
    let decoded = decode_base64_text(contents).map_err(|e| ConvertError::SubscriptionDecode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    let mut outbounds = Vec::new();
    for line in decoded.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
        match registry.parse_link(line) {
            Ok(outbound) => outbounds.push(outbound),
            Err(e) => warn!(
                "Skipping invalid link in subscription: \"{}...\": {}",
                char_prefix(line, 30),
                e
            ),
        }
    }
    Ok(outbounds)
}
