use serde::de::DeserializeOwned;

use crate::{FailureKind, FetchError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode a JSON response body into `T`. A leading UTF-8 BOM is tolerated.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FetchError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    serde_json::from_slice(body).map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))
}
