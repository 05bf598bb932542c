use serde::de::DeserializeOwned;

use crate::catalog::CatalogResult;

pub mod mapper;
pub mod models;

/// Decode a JSON request body. Malformed JSON, missing attributes and unknown
/// request variants all come back as InvalidArgument.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> CatalogResult<T> {
    Ok(serde_json::from_slice(body)?)
}
