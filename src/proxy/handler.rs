use crate::{
    config::ProxyConfig,
    error::{ProxyError, Result},
    gemini::{GeminiClient, GenerationBackend},
    logger,
    models::ImageResponse,
    proxy::{
        body::{check_declared_length, read_limited},
        payload::build_payload,
        request::parse_generation_request,
        response::map_upstream_reply,
    },
};
use actix_web::http::Method;
use bytes::Bytes;
use futures::Stream;
use std::fmt::Display;
use std::sync::Arc;
use uuid::Uuid;

/// An inbound call as seen by the handler: method, declared length and the
/// body as a byte stream.
pub struct InboundRequest<S> {
    pub method: Method,
    pub content_length: Option<u64>,
    pub body: S,
}

impl<S> InboundRequest<S> {
    pub fn new(method: Method, body: S) -> Self {
        Self {
            method,
            content_length: None,
            body,
        }
    }

    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// CORS preflight; answered without touching the body.
    Preflight,
    Image(ImageResponse),
}

#[derive(Clone)]
pub struct ProxyHandler {
    config: Arc<ProxyConfig>,
    backend: Arc<dyn GenerationBackend>,
}

impl ProxyHandler {
    pub fn new(config: Arc<ProxyConfig>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { config, backend }
    }

    /// Handler backed by the real Gemini client.
    pub fn from_config(config: ProxyConfig) -> Result<Self> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(Arc::new(config), Arc::new(client)))
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub async fn handle<S, E>(&self, request: InboundRequest<S>) -> Result<HandlerOutcome>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let request_id = Uuid::new_v4();
        let method = request.method.clone();
        log::info!("[req:{}] {} generate-image", request_id, method);

        let outcome = self.run(request_id, request).await;
        match &outcome {
            Ok(HandlerOutcome::Preflight) => {
                log::debug!("[req:{}] answered preflight", request_id);
            }
            Ok(HandlerOutcome::Image(_)) => {
                log::info!("[req:{}] image generated", request_id);
            }
            Err(e) if e.is_client_error() => {
                log::warn!("[req:{}] rejected: {}", request_id, e);
            }
            Err(e) => {
                log::error!("[req:{}] Gemini API proxy error: {}", request_id, e);
            }
        }
        outcome
    }

    async fn run<S, E>(&self, request_id: Uuid, request: InboundRequest<S>) -> Result<HandlerOutcome>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        if request.method == Method::OPTIONS {
            return Ok(HandlerOutcome::Preflight);
        }
        if request.method != Method::POST {
            return Err(ProxyError::MethodNotAllowed(request.method.to_string()));
        }

        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| ProxyError::MissingApiKey(self.config.api_key_var.clone()))?;

        let limit = self.config.max_body_bytes;
        check_declared_length(request.content_length, limit)?;
        let body = read_limited(request.body, limit).await?;

        let generation = parse_generation_request(&body)?;
        let payload = build_payload(&generation);
        log::debug!(
            "[req:{}] prompt of {} chars, reference image: {}",
            request_id,
            generation.prompt.chars().count(),
            generation
                .base64_image
                .as_ref()
                .map(|img| format!("{} ({} base64 chars)", generation.mime_type(), img.len()))
                .unwrap_or_else(|| "none".to_string())
        );

        let reply = {
            let _timer = logger::timer("Gemini generateContent");
            self.backend.generate_content(api_key, &payload).await?
        };

        map_upstream_reply(reply).map(HandlerOutcome::Image)
    }
}
