//! Error types for the conversion pipeline
//!
//! Every failure the library can report is classified into a [`ConvertError`]
//! variant so callers can tell per-line parse problems apart from problems with
//! the input as a whole.

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Classified conversion error
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input was empty or whitespace only
    #[error("input is empty")]
    EmptyInput,

    /// Link payload could not be decoded (bad base64, bad JSON)
    #[error("invalid link '{prefix}...': {reason}")]
    InvalidLink { prefix: String, reason: String },

    /// Link decoded but is missing a required part or carries a bad value
    #[error("malformed {scheme} link: {reason}")]
    MalformedLink { scheme: &'static str, reason: String },

    /// Line does not start with a supported scheme
    #[error("unsupported link scheme: {prefix}...")]
    UnsupportedScheme { prefix: String },

    /// Subscription could not be fetched
    #[error("failed to fetch subscription {url}: {detail}")]
    SubscriptionFetch { url: String, detail: String },

    /// Subscription body could not be decoded
    #[error("failed to decode subscription {url}: {detail}")]
    SubscriptionDecode { url: String, detail: String },

    /// Input was non-empty but produced no outbound at all
    #[error("no valid proxy links or subscriptions could be converted")]
    NothingConvertible,

    /// Saved configuration name is empty after sanitizing
    #[error("invalid configuration name '{0}'")]
    InvalidConfigName(String),

    /// Saved configuration store failure
    #[error("config store error: {0}")]
    Store(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn malformed(scheme: &'static str, reason: impl Into<String>) -> Self {
        ConvertError::MalformedLink {
            scheme,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_link(link: &str, reason: impl Into<String>) -> Self {
        ConvertError::InvalidLink {
            prefix: char_prefix(link, 25),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(line: &str) -> Self {
        ConvertError::UnsupportedScheme {
            prefix: char_prefix(line, 30),
        }
    }

    /// Whether the error is about the input as a whole rather than one line
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::EmptyInput | ConvertError::NothingConvertible
        )
    }
}

/// First `n` characters of `s`, never splitting a code point
pub fn char_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_prefix_multibyte() {
        assert_eq!(char_prefix("ñandú-proxy", 5), "ñandú");
        assert_eq!(char_prefix("ab", 30), "ab");
    }

    #[test]
    fn test_unsupported_carries_30_chars() {
        let line = "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@example.com:8388";
        match ConvertError::unsupported(line) {
            ConvertError::UnsupportedScheme { prefix } => {
                assert_eq!(prefix.chars().count(), 30);
                assert!(line.starts_with(&prefix));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(ConvertError::EmptyInput.is_fatal());
        assert!(ConvertError::NothingConvertible.is_fatal());
        assert!(!ConvertError::unsupported("foo://bar").is_fatal());
    }
}
