use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

static PROXY_LOGGER: Lazy<ProxyLogger> = Lazy::new(ProxyLogger::new);

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let level = config.min_level;
    PROXY_LOGGER.update_config(config);

    log::set_logger(&*PROXY_LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;
    log::set_max_level(level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub format: LogFormat,
    pub show_colors: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            format: LogFormat::Pretty,
            show_colors: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.format = if enabled {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        self
    }

    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            show_colors: false,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }

    /// `LOG_LEVEL` (trace..error), `LOG_FORMAT` (`json` or `dev`) and `NO_COLOR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            Some(format) if format == "json" => Self::production(),
            Some(format) if format == "dev" || format == "development" => Self::development(),
            _ => Self::default(),
        };
        if let Some(level) = lookup("LOG_LEVEL").and_then(|v| LevelFilter::from_str(&v).ok()) {
            config = config.with_level(level);
        }
        if lookup("NO_COLOR").is_some() {
            config = config.with_colors(false);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: record.level().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location: match (record.file(), record.line()) {
                (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
                _ => None,
            },
        }
    }
}

fn level_color(level: &str) -> Color {
    match level {
        "ERROR" => Color::Red,
        "WARN" => Color::Yellow,
        "INFO" => Color::Green,
        "DEBUG" => Color::Blue,
        _ => Color::Cyan,
    }
}

pub struct ProxyLogger {
    config: RwLock<LoggerConfig>,
}

impl ProxyLogger {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(LoggerConfig::default()),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if let Ok(mut config) = self.config.write() {
            *config = new_config;
        }
    }

    fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.format == LogFormat::Json {
            return serde_json::to_string(entry).unwrap_or_default();
        }

        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = format!("{:<5}", entry.level);
        let mut line = if config.show_colors {
            format!(
                "{} [{}] {}: {}",
                timestamp.bright_black(),
                level.color(level_color(&entry.level)).bold(),
                entry.target.bright_blue(),
                entry.message
            )
        } else {
            format!(
                "{} [{}] {}: {}",
                timestamp, level, entry.target, entry.message
            )
        };

        if config.show_file_location {
            if let Some(location) = &entry.location {
                line.push_str(&format!(" ({})", location));
            }
        }
        line
    }
}

impl Default for ProxyLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for ProxyLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config
            .read()
            .map(|config| metadata.level() <= config.min_level)
            .unwrap_or(true)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);
        if let Ok(config) = self.config.read() {
            let line = Self::format_line(&entry, &config);
            if record.level() <= Level::Warn {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}

/// Logs how long a scope took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("{} completed in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, config: &crate::config::ProxyConfig) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Listening on http://{}:{}", config.host, config.port);
    log::info!("Upstream endpoint: {}", config.generate_content_url());
    log::info!(
        "API key transport: {:?}, timeout: {}s, max body: {} bytes",
        config.key_transport,
        config.timeout.as_secs(),
        config.max_body_bytes
    );
    if config.api_key().is_none() {
        log::warn!(
            "{} is not set; generation requests will fail until it is",
            config.api_key_var
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: level.to_string(),
            target: "gemini_image_proxy::proxy".to_string(),
            message: message.to_string(),
            location: Some("src/proxy/handler.rs:42".to_string()),
        }
    }

    #[test]
    fn test_logger_config_presets() {
        let config = LoggerConfig::development();
        assert_eq!(config.min_level, LevelFilter::Debug);
        assert!(config.show_colors);

        let prod_config = LoggerConfig::production();
        assert!(!prod_config.show_colors);
        assert_eq!(prod_config.format, LogFormat::Json);
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_config_from_lookup() {

        let config = LoggerConfig::from_lookup(vars(&[]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.min_level, LevelFilter::Info);
        assert!(config.show_colors);

        let config = LoggerConfig::from_lookup(vars(&[("LOG_FORMAT", "JSON"), ("LOG_LEVEL", "warn")]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.min_level, LevelFilter::Warn);
        assert!(!config.show_colors);

        let config = LoggerConfig::from_lookup(vars(&[("LOG_FORMAT", "dev"), ("NO_COLOR", "1")]));
        assert_eq!(config.min_level, LevelFilter::Debug);
        assert!(config.show_file_location);
        assert!(!config.show_colors);

        let config = LoggerConfig::from_lookup(vars(&[("LOG_LEVEL", "loud")]));
        assert_eq!(config.min_level, LevelFilter::Info);
    }

    #[test]
    fn test_plain_line_contains_level_and_message() {
        let config = LoggerConfig::new().with_colors(false);
        let line = ProxyLogger::format_line(&entry("WARN", "rejected: prompt is required"), &config);
        assert!(line.contains("[WARN ]"));
        assert!(line.ends_with("gemini_image_proxy::proxy: rejected: prompt is required"));
    }

    #[test]
    fn test_json_line_is_parseable() {
        let config = LoggerConfig::new().with_json_output(true);
        let line = ProxyLogger::format_line(&entry("INFO", "image generated"), &config);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "image generated");
    }

    #[test]
    fn test_logger_initialization() {
        let config = LoggerConfig::development();
        assert!(init_with_config(config).is_ok());
    }
}
