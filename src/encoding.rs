use crate::error::Result;
use base64::prelude::{Engine as _, BASE64_STANDARD};

/// Base64 of the UTF-8 bytes of `content`, as the contents API expects.
pub fn encode_content(content: &str) -> String {
    BASE64_STANDARD.encode(content.as_bytes())
}

/// Decodes a contents API payload. GitHub wraps the base64 at 60 columns, so
/// whitespace is dropped before decoding.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64_STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}
