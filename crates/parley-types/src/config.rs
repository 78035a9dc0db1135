//! Application configuration types for Parley.
//!
//! `AppConfig` mirrors `parley.toml`. Every field has a default, so an empty
//! or missing file yields a runnable (development) configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Size of the read-only pool. Writes always go through one connection.
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://parley.db?mode=rwc".to_string()
}

fn default_max_readers() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl DatabaseConfig {
    /// Defaults with a different URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_readers: default_max_readers(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. Required to serve.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

fn default_token_ttl_hours() -> u64 {
    24 * 30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,
    #[serde(default = "default_title_temperature")]
    pub title_temperature: f64,
    /// Hard ceiling on a single completion call. `0` disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_title_max_tokens() -> u32 {
    50
}

fn default_title_temperature() -> f64 {
    0.3
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            title_max_tokens: default_title_max_tokens(),
            title_temperature: default_title_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Conversation behaviour knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Prior messages sent to the model as context.
    #[serde(default = "default_history_window")]
    pub history_window: u32,
    /// Page size of `GET /messages` when `limit` is omitted.
    #[serde(default = "default_message_page_limit")]
    pub message_page_limit: u32,
    /// Largest accepted `limit` on `GET /messages`.
    #[serde(default = "default_max_message_page")]
    pub max_message_page: u32,
}

fn default_history_window() -> u32 {
    10
}

fn default_message_page_limit() -> u32 {
    50
}

fn default_max_message_page() -> u32 {
    200
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            message_page_limit: default_message_page_limit(),
            max_message_page: default_max_message_page(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
    /// Export spans through the OpenTelemetry stdout pipeline.
    #[serde(default)]
    pub otel: bool,
}

fn default_log_filter() -> String {
    "info,parley=debug,sqlx=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
            otel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.ai.max_output_tokens, 1000);
        assert!((config.ai.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.chat.history_window, 10);
        assert_eq!(config.chat.message_page_limit, 50);
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.database.max_readers, 8);
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.auth.token_ttl_hours, 720);
        assert_eq!(config.ai.request_timeout_secs, 60);
    }

    #[test]
    fn test_app_config_deserialize_partial_sections() {
        let toml_str = r#"
[server]
port = 8080

[ai]
model = "gemini-2.5-pro"
temperature = 0.2

[chat]
history_window = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ai.model, "gemini-2.5-pro");
        assert_eq!(config.ai.max_output_tokens, 1000);
        assert_eq!(config.chat.history_window, 4);
        assert_eq!(config.chat.message_page_limit, 50);
    }
}
