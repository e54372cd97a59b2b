use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::assembler::AssemblyProfile;
use super::helpers::expand_tilde;
use super::subscription::{DEFAULT_RELAY_ENDPOINT, FetchMode};

// ============================================================================
// Settings Types
// ============================================================================

/// Converter settings parsed from TOML. Every key is optional.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    /// `relay` (default) or `direct`
    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// Relay endpoint used in relay mode; the subscription URL is appended
    /// as the `url` query parameter
    #[serde(default = "default_relay_endpoint")]
    pub relay_endpoint: String,

    /// Per-request timeout in seconds, 0 disables it. Default 30.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Saved configurations file, default "~/.config/boxlink/configs.json"
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Listener and selector constants of the generated profile
    #[serde(default)]
    pub profile: AssemblyProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_mode: FetchMode::default(),
            relay_endpoint: default_relay_endpoint(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            store_path: default_store_path(),
            profile: AssemblyProfile::default(),
        }
    }
}

// ============================================================================
// Settings Implementation
// ============================================================================

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).context("Failed to parse settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch_mode == FetchMode::Relay {
            let endpoint = url::Url::parse(&self.relay_endpoint)
                .with_context(|| format!("Invalid relay_endpoint: {}", self.relay_endpoint))?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                bail!("relay_endpoint must be an http(s) URL: {}", self.relay_endpoint);
            }
        }
        if self.profile.mixed_listen_port == 0 {
            bail!("profile.mixed_listen_port must be non-zero");
        }
        Ok(())
    }

    /// Load settings from a file path; a missing file yields defaults
    pub async fn load(path: &str) -> Result<Self> {
        let expanded = expand_tilde(path);
        let path = Path::new(&expanded);
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Settings file {:?} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read settings from {:?}", path));
            }
        };
        Self::from_toml(&content)
    }

    /// Request timeout, `None` when disabled
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.store_path))
    }
}

fn default_relay_endpoint() -> String {
    DEFAULT_RELAY_ENDPOINT.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_store_path() -> String {
    "~/.config/boxlink/configs.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fetch_mode, FetchMode::Relay);
        assert_eq!(settings.fetch_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.profile.mixed_listen_port, 2080);
    }

    #[test]
    fn test_full_toml() {
        let settings = Settings::from_toml(
            r#"
            fetch_mode = "direct"
            fetch_timeout_secs = 0
            store_path = "/tmp/boxlink.json"

            [profile]
            tun_interface_name = "utun7"
            mixed_listen_port = 7890
            "#,
        )
        .unwrap();
        assert_eq!(settings.fetch_mode, FetchMode::Direct);
        assert_eq!(settings.fetch_timeout(), None);
        assert_eq!(settings.store_path(), PathBuf::from("/tmp/boxlink.json"));
        assert_eq!(settings.profile.tun_interface_name, "utun7");
        assert_eq!(settings.profile.mixed_listen, "127.0.0.1");
        assert_eq!(settings.profile.probe_interval, "10m");
    }

    #[test]
    fn test_invalid_relay_endpoint() {
        assert!(Settings::from_toml(r#"relay_endpoint = "not a url""#).is_err());
        assert!(Settings::from_toml(r#"relay_endpoint = "ftp://relay.example.com""#).is_err());
        // ignored in direct mode
        assert!(
            Settings::from_toml(
                r#"
                fetch_mode = "direct"
                relay_endpoint = "not a url"
                "#
            )
            .is_ok()
        );
    }

    #[test]
    fn test_zero_listen_port_rejected() {
        let err = Settings::from_toml("[profile]\nmixed_listen_port = 0").unwrap_err();
        assert!(err.to_string().contains("mixed_listen_port"));
    }

    #[test]
    fn test_unknown_fetch_mode_rejected() {
        assert!(Settings::from_toml(r#"fetch_mode = "carrier-pigeon""#).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("not-a-dir");
        tokio::fs::write(&parent, "").await.unwrap();
        let path = parent.join("boxlink.toml");
        let err = Settings::load(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxlink.toml");
        tokio::fs::write(&path, "fetch_timeout_secs = 5\n").await.unwrap();
        let settings = Settings::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(settings.fetch_timeout(), Some(Duration::from_secs(5)));
    }
}
