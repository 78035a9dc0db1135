//! Configuration loader for Parley.
//!
//! Reads `parley.toml` (or the path given with `--config`) into
//! [`AppConfig`], then layers `PARLEY_*` / `GEMINI_API_KEY` environment
//! overrides on top. Falls back to defaults when the file is missing or
//! malformed.

use std::path::Path;

use parley_types::config::AppConfig;

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Apply environment overrides using the process environment.
pub fn apply_process_env(config: AppConfig) -> AppConfig {
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply environment overrides from `lookup`.
///
/// Empty values are ignored. Numeric values that fail to parse are logged
/// and ignored.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("PARLEY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = get("PARLEY_PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring PARLEY_PORT={port}: not a port number"),
        }
    }
    if let Some(url) = get("PARLEY_DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(secret) = get("PARLEY_JWT_SECRET") {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(ttl) = get("PARLEY_TOKEN_TTL_HOURS") {
        match ttl.trim().parse() {
            Ok(ttl) => config.auth.token_ttl_hours = ttl,
            Err(_) => tracing::warn!("Ignoring PARLEY_TOKEN_TTL_HOURS={ttl}: not a number"),
        }
    }
    if let Some(key) = get("GEMINI_API_KEY") {
        config.ai.api_key = Some(key);
    }
    if let Some(model) = get("PARLEY_AI_MODEL") {
        config.ai.model = model;
    }
    if let Some(base_url) = get("PARLEY_AI_BASE_URL") {
        config.ai.base_url = base_url;
    }

    config
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("parley.toml")).await;
        assert_eq!(config.server.port, 5001);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[tokio::test]
    async fn test_load_config_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parley.toml");
        tokio::fs::write(
            &path,
            "[server]\nport = 9000\n\n[auth]\njwt_secret = \"file-secret\"\n",
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("file-secret"));
        assert_eq!(config.ai.model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_load_config_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parley.toml");
        tokio::fs::write(&path, "this is not valid toml {{{}}}").await.unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn test_env_overrides_win_over_file_values() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("file-secret".into());

        let config = apply_env_overrides(
            config,
            env(&[
                ("PARLEY_PORT", "7000"),
                ("PARLEY_JWT_SECRET", "env-secret"),
                ("GEMINI_API_KEY", "key-123"),
                ("PARLEY_AI_MODEL", "gemini-2.5-pro"),
            ]),
        );

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("env-secret"));
        assert_eq!(config.ai.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.ai.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_env_overrides_ignore_empty_and_unparseable() {
        let config = apply_env_overrides(
            AppConfig::default(),
            env(&[("PARLEY_PORT", "not-a-port"), ("PARLEY_JWT_SECRET", "  ")]),
        );

        assert_eq!(config.server.port, 5001);
        assert!(config.auth.jwt_secret.is_none());
    }
}
