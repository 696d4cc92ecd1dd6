use serde_json::{Map, Value};

use crate::error::Result;

/// Parsed node metadata: a free-form JSON object.
pub type NodeMetadata = Map<String, Value>;

/// Parse the serialized `metadata` field of a node.
///
/// Returns `Validation` when the payload is valid JSON but not an object;
/// JSON syntax errors propagate as `Json`. Callers that only need a derived
/// value should prefer [`extract_image_url`], which recovers from malformed
/// payloads instead of failing.
pub fn parse_node_metadata(raw: &str) -> Result<NodeMetadata> {
    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(crate::error::CanopyError::Validation(format!(
            "Node metadata must be a JSON object, got {other}"
        ))),
    }
}

/// Extract the `image_url` from a node's raw metadata, if any.
///
/// Malformed metadata is recovered locally: a warning is logged and `None`
/// returned, so the raw string stays displayable and nothing fatal
/// propagates.
pub fn extract_image_url(metadata: Option<&str>) -> Option<String> {
    let raw = metadata?;
    if raw.trim().is_empty() {
        return None;
    }

    match parse_node_metadata(raw) {
        Ok(parsed) => parsed
            .get("image_url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        Err(e) => {
            tracing::warn!("Failed to parse node metadata: {}", e);
            None
        }
    }
}
