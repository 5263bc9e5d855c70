use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Configuration error: {0} is not set")]
    MissingApiKey(String),
    #[error("Payload error: body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Payload error: {0}")]
    BodyRead(String),
    #[error("Request error: invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("Request error: prompt is required")]
    MissingPrompt,
    #[error("Upstream error: status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Upstream {
        status: u16,
        message: Option<String>,
    },
    #[error("Response error: no image data: {}", .0.as_deref().unwrap_or("no text part"))]
    NoImageData(Option<String>),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProxyError {
    /// HTTP status returned to the caller.
    pub fn http_status(&self) -> u16 {
        match self {
            ProxyError::MethodNotAllowed(_) => 405,
            ProxyError::PayloadTooLarge { .. }
            | ProxyError::BodyRead(_)
            | ProxyError::InvalidJson(_)
            | ProxyError::MissingPrompt => 400,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::MissingApiKey(_)
            | ProxyError::NoImageData(_)
            | ProxyError::Transport(_) => 500,
        }
    }

    /// The message placed in the `error` field of the JSON response. Internal
    /// detail such as serde positions stays in the `Display` form for logs.
    pub fn client_message(&self) -> String {
        match self {
            ProxyError::MethodNotAllowed(_) => "Method Not Allowed".to_string(),
            ProxyError::MissingApiKey(var) => format!("Missing {} environment variable.", var),
            ProxyError::PayloadTooLarge { limit } => {
                format!("Payload too large. Maximum size is {} bytes.", limit)
            }
            ProxyError::BodyRead(_) => "Failed to read request body.".to_string(),
            ProxyError::InvalidJson(_) => "Invalid JSON payload.".to_string(),
            ProxyError::MissingPrompt => "Prompt is required.".to_string(),
            ProxyError::Upstream { status, message } => non_empty(message.as_deref())
                .map(String::from)
                .unwrap_or_else(|| format!("Gemini API request failed with status {}.", status)),
            ProxyError::NoImageData(text) => non_empty(text.as_deref())
                .unwrap_or("API did not return image data.")
                .to_string(),
            ProxyError::Transport(msg) => non_empty(Some(msg.as_str()))
                .unwrap_or("Unexpected server error.")
                .to_string(),
        }
    }

    /// Errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProxyError::MethodNotAllowed(_)
                | ProxyError::PayloadTooLarge { .. }
                | ProxyError::BodyRead(_)
                | ProxyError::InvalidJson(_)
                | ProxyError::MissingPrompt
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        // The query-parameter key transport puts the API key in the URL.
        ProxyError::Transport(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
