use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProxyError, Result};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Validated body of an inbound generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub base64_image: Option<String>,
    pub mime_type: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            base64_image: None,
            mime_type: None,
        }
    }

    pub fn with_image(mut self, base64_image: impl Into<String>, mime_type: Option<String>) -> Self {
        self.base64_image = Some(base64_image.into());
        self.mime_type = mime_type;
        self
    }

    /// Extracts `prompt`, `base64Image` and `mimeType` from a JSON document.
    /// Absent, `null`, empty and non-string values all count as missing, and
    /// a document that is not an object has no fields at all.
    pub fn from_value(value: &Value) -> Result<Self> {
        let prompt = string_field(value, "prompt").ok_or(ProxyError::MissingPrompt)?;

        Ok(Self {
            prompt,
            base64_image: string_field(value, "base64Image"),
            mime_type: string_field(value, "mimeType"),
        })
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

impl ImageResponse {
    pub fn from_png_base64(data: &str) -> Self {
        Self {
            image_url: format!("data:image/png;base64,{}", data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
