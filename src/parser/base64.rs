//! Base64 decoding utilities
//!
//! vmess payloads and subscription bodies show up in every base64 flavour:
//! standard or URL-safe alphabet, with or without padding, wrapped across
//! lines.

use std::string::FromUtf8Error;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum Base64Error {
    #[error("not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("decoded content is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Decodes Base64 content, trying standard, URL-safe and unpadded variants.
///
/// Whitespace in the input is removed before decoding.
pub fn decode_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    trace!("Attempting Base64 decode of {} bytes", cleaned.len());

    if let Ok(decoded) = STANDARD.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(&cleaned) {
        return Ok(decoded);
    }

    let padded = add_base64_padding(&cleaned);
    if let Ok(decoded) = STANDARD.decode(&padded) {
        trace!("Decoded after adding padding");
        return Ok(decoded);
    }
    URL_SAFE.decode(&padded)
}

/// Decodes Base64 content into UTF-8 text
pub fn decode_base64_text(content: &str) -> Result<String, Base64Error> {
    let bytes = decode_base64(content)?;
    Ok(String::from_utf8(bytes)?)
}

/// Pads a Base64 string with `=` up to a multiple of 4
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_standard() {
        let decoded = decode_base64_text("aGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_decode_without_padding() {
        let decoded = decode_base64_text("aGVsbG8gd29ybGQ").unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_decode_wrapped_lines() {
        let decoded = decode_base64_text("aGVs\nbG8g\r\nd29y\tbGQ=  ").unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        // bytes 0xfb 0xff encode to "+/8" in the standard alphabet
        assert_eq!(decode_base64("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_link_list() {
        let original = "vless://u@a.com:443#one\nhy2://p@b.com:8443#two";
        let encoded = STANDARD.encode(original);
        assert_eq!(decode_base64_text(&encoded).unwrap(), original);
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_base64("not valid base64!!!").is_err());
    }

    #[test]
    fn test_decode_non_utf8() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_base64_text(&encoded),
            Err(Base64Error::Utf8(_))
        ));
    }

    #[test]
    fn test_add_base64_padding() {
        assert_eq!(add_base64_padding("abcd"), "abcd");
        assert_eq!(add_base64_padding("abc"), "abc=");
        assert_eq!(add_base64_padding("ab"), "ab==");
        assert_eq!(add_base64_padding(""), "");
    }
}
