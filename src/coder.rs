use base64::{engine::general_purpose, Engine as _};
use error_stack::Report;
use serde::Serializer;

use crate::error::{CoderError, CoderResult};

/// Encode raw bytes for the contents API.
pub fn encode(content: &[u8]) -> String {
    general_purpose::STANDARD.encode(content)
}

/// Decode content returned by the contents API.
///
/// GitHub wraps base64 payloads at 60 columns, so line breaks are stripped
/// before decoding.
pub fn decode(encoded: &str) -> CoderResult<Vec<u8>> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| Report::new(CoderError::Base64(e.to_string())))
}

pub(crate) fn serialize_optional<S>(content: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match content {
        Some(bytes) => serializer.serialize_some(&encode(bytes)),
        None => serializer.serialize_none(),
    }
}
