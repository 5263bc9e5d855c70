use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// How the API key reaches the Gemini endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransport {
    /// `x-goog-api-key` request header.
    Header,
    /// `key` URL query parameter.
    Query,
}

impl FromStr for KeyTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(KeyTransport::Header),
            "query" => Ok(KeyTransport::Query),
            other => Err(format!("unknown key transport '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub api_key_var: String,
    pub model: String,
    pub base_url: String,
    pub key_transport: KeyTransport,
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub host: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            api_key: None,
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            key_transport: KeyTransport::Header,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let key_transport = match lookup("GEMINI_API_KEY_TRANSPORT") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{}, using header transport", e);
                KeyTransport::Header
            }),
            None => defaults.key_transport,
        };

        ProxyConfig {
            api_key: lookup(DEFAULT_API_KEY_VAR),
            api_key_var: defaults.api_key_var,
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: lookup("GEMINI_API_BASE_URL").unwrap_or(defaults.base_url),
            key_transport,
            timeout: lookup("GEMINI_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_body_bytes: lookup("MAX_BODY_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_key_transport(mut self, transport: KeyTransport) -> Self {
        self.key_transport = transport;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// The configured key, treating an empty value as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}
