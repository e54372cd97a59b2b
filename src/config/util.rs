//! Utility functions for serde serialization/deserialization.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Skip Helpers
// ============================================================================

/// Used with `#[serde(skip_serializing_if = "is_false")]` to omit false values.
#[inline]
pub fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// String or Vec Deserializer
// ============================================================================

/// Rule matchers are accepted both as `"x"` and `["x", "y"]` when a saved
/// document is loaded back.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrVec {
    Single(String),
    Multiple(Vec<String>),
}

/// Use with `#[serde(default, deserialize_with = "string_or_vec")]`
pub fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::Single(s) => Ok(vec![s]),
        StringOrVec::Multiple(v) => Ok(v),
    }
}

// ============================================================================
// Tests
// ============================================================================
