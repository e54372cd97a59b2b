//! Outbound tag sanitizing
//!
//! Share links carry free-form display names (emoji, flags, punctuation,
//! mixed scripts). sing-box tags are referenced from selectors and DNS
//! detours, so they are normalized to letters, digits, `_` and `-`.

use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum tag length in characters
pub const MAX_TAG_LEN: usize = 50;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\p{Z}\p{P}_ \-]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static BLACKLIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[|()\[\]{}:;"'<>,.?/~`!@#$%^&*+=]"#).expect("valid regex"));
static NON_TAG_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_\-]").expect("valid regex"));
static REPEATED_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));

/// Sanitizes a display name into an outbound tag using the wall clock for
/// the empty-name fallback.
pub fn sanitize_tag(raw: Option<&str>) -> String {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    sanitize_tag_at(raw, now_ms)
}

/// Sanitizes a display name into an outbound tag.
///
/// When nothing usable survives, returns `proxy_tag_<now_ms % 10000>`.
pub fn sanitize_tag_at(raw: Option<&str>, now_ms: u128) -> String {
    let cleaned = raw.map(clean).unwrap_or_default();
    if cleaned.is_empty() {
        format!("proxy_tag_{}", now_ms % 10_000)
    } else {
        cleaned
    }
}

fn clean(raw: &str) -> String {
    let s = DISALLOWED.replace_all(raw, "");
    let s = WHITESPACE.replace_all(s.trim(), "_");
    let s = BLACKLIST.replace_all(&s, "_");
    let s = NON_TAG_CHAR.replace_all(&s, "_");
    let s = REPEATED_UNDERSCORE.replace_all(&s, "_");
    s.trim_matches('_').chars().take(MAX_TAG_LEN).collect()
}

/// Whether `tag` satisfies the tag invariant
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.chars().count() <= MAX_TAG_LEN
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
