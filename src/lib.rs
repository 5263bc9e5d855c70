pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod proxy;
pub mod server;

pub use config::{KeyTransport, ProxyConfig};
pub use error::{ProxyError, Result};
pub use gemini::{GeminiClient, GenerationBackend, UpstreamReply};
pub use models::{ErrorResponse, GenerateContentRequest, GenerationRequest, ImageResponse};
pub use proxy::{HandlerOutcome, InboundRequest, ProxyHandler};
