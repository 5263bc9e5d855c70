use crate::{
    error::{ProxyError, Result},
    models::GenerationRequest,
};
use serde_json::{Map, Value};

/// Parses a raw request body. An empty body is an empty object, so it fails
/// on the prompt check rather than on JSON parsing.
pub fn parse_generation_request(body: &[u8]) -> Result<GenerationRequest> {
    let value = if body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(|e| ProxyError::InvalidJson(e.to_string()))?
    };

    GenerationRequest::from_value(&value)
}
