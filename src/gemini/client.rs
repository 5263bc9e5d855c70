use crate::{
    config::{KeyTransport, ProxyConfig},
    error::{ProxyError, Result},
    gemini::{GenerationBackend, UpstreamReply},
    models::GenerateContentRequest,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    key_transport: KeyTransport,
}

impl GeminiClient {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProxyError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.generate_content_url(),
            key_transport: config.key_transport,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if self.key_transport == KeyTransport::Header {
            let value = HeaderValue::from_str(api_key).map_err(|_| {
                ProxyError::Transport("API key contains characters not valid in a header".into())
            })?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers(api_key)?)
            .json(request);
        if self.key_transport == KeyTransport::Query {
            builder = builder.query(&[("key", api_key)]);
        }

        log::info!("Calling Gemini endpoint: {}", self.endpoint);

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            log::error!("Gemini request failed before a response arrived: {}", e);
            ProxyError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(e) => {
                log::warn!("Failed to read Gemini response body: {}", e.without_url());
                None
            }
        };

        log::debug!(
            "Gemini responded with status {} ({} body)",
            status,
            if body.is_some() { "JSON" } else { "no JSON" }
        );

        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_transport_sets_api_key_header() {
        let client = GeminiClient::new(&ProxyConfig::new()).unwrap();
        let headers = client.build_headers("secret").unwrap();
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "secret");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_query_transport_keeps_key_out_of_headers() {
        let config = ProxyConfig::new().with_key_transport(KeyTransport::Query);
        let client = GeminiClient::new(&config).unwrap();
        let headers = client.build_headers("secret").unwrap();
        assert!(headers.get(API_KEY_HEADER).is_none());
    }

    #[test]
    fn test_invalid_header_key_is_rejected() {
        let client = GeminiClient::new(&ProxyConfig::new()).unwrap();
        assert!(matches!(
            client.build_headers("bad\nkey"),
            Err(ProxyError::Transport(_))
        ));
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = ProxyConfig::new()
            .with_base_url("http://127.0.0.1:1")
            .with_model("gemini-test");
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:1/models/gemini-test:generateContent"
        );
    }
}
