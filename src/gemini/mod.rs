pub mod client;

use crate::{error::Result, models::GenerateContentRequest};
use async_trait::async_trait;
use serde_json::Value;

pub use client::GeminiClient;

/// Status and body of one upstream call. `body` is `None` when the upstream
/// did not answer with JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl UpstreamReply {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single outbound call the proxy makes per request. Transport failures
/// are `Err`; any HTTP answer, including error statuses, is `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply>;
}
