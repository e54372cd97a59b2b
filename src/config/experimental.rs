use serde::{Deserialize, Serialize};

use crate::config::util::is_false;

/// Experimental section of the generated document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Experimental {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<CacheFile>,
}

/// Cache file configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CacheFile {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Path to the cache file (sing-box default: "cache.db")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_enabled() {
        let exp = Experimental {
            cache_file: Some(CacheFile {
                enabled: true,
                path: None,
            }),
        };
        let json = serde_json::to_value(&exp).unwrap();
        assert_eq!(json, serde_json::json!({"cache_file": {"enabled": true}}));
    }
}
