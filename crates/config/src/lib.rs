//! Configuration loading, validation, and management for Respondo.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! for secrets. Validates provider settings at startup so a missing API key
//! is a startup error, not a mid-invocation surprise.

use respondo_core::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Per-provider settings keyed by the closed provider set.
    #[serde(default)]
    pub providers: HashMap<ProviderKind, ProviderConfig>,

    /// Embeddings backend; absent means retrieval degrades to no-RAG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<EmbeddingsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8420
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, or ":memory:" for ephemeral (tests).
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "respondo.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: default_database_url() }
    }
}

/// Where final replies and out-of-hours auto-replies are POSTed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Required for the gateway provider; optional elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model used when the agent profile has no override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embeddings_base_url")]
    pub base_url: String,

    #[serde(default = "default_embeddings_model")]
    pub model: String,
}

fn default_embeddings_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embeddings_model() -> String {
    "text-embedding-3-small".into()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("delivery", &self.delivery)
            .field("providers", &self.providers)
            .field("embeddings", &self.embeddings)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply env overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io { path: path.display().to_string(), source: e })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus env overrides — used when no config file exists.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Pull API keys from well-known environment variables. Env wins over
    /// file so deployments never need secrets on disk.
    fn apply_env_overrides(&mut self) {
        let overrides = [
            (ProviderKind::Anthropic, "ANTHROPIC_API_KEY"),
            (ProviderKind::OpenAi, "OPENAI_API_KEY"),
            (ProviderKind::Gateway, "RESPONDO_GATEWAY_API_KEY"),
        ];
        for (kind, var) in overrides {
            if let Ok(key) = std::env::var(var) {
                if !key.is_empty() {
                    self.providers.entry(kind).or_default().api_key = Some(key);
                }
            }
        }
        if let Ok(url) = std::env::var("RESPONDO_DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(url) = std::env::var("RESPONDO_DELIVERY_WEBHOOK_URL") {
            if !url.is_empty() {
                self.delivery.webhook_url = Some(url);
            }
        }
        if let Ok(key) = std::env::var("RESPONDO_EMBEDDINGS_API_KEY") {
            if !key.is_empty() {
                let emb = self.embeddings.get_or_insert_with(|| EmbeddingsConfig {
                    api_key: None,
                    base_url: default_embeddings_base_url(),
                    model: default_embeddings_model(),
                });
                emb.api_key = Some(key);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (kind, provider) in &self.providers {
            if *kind == ProviderKind::Gateway && provider.base_url.is_none() {
                return Err(ConfigError::Invalid(
                    "gateway provider requires a base_url".into(),
                ));
            }
        }
        Ok(())
    }

    /// Settings for one provider family, if configured.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_src = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "crm.db"

            [delivery]
            webhook_url = "https://hooks.example.com/outbound"

            [providers.anthropic]
            api_key = "sk-ant-test"
            default_model = "claude-sonnet-4-20250514"

            [providers.gateway]
            api_key = "gw-test"
            base_url = "https://llm.internal/v1"
            default_model = "llama-3.3-70b"

            [embeddings]
            api_key = "sk-emb"
            model = "text-embedding-3-small"
        "#;
        let mut config: AppConfig = toml::from_str(toml_src).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url, "crm.db");
        let anthropic = config.provider(ProviderKind::Anthropic).unwrap();
        assert_eq!(anthropic.default_model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert!(config.embeddings.is_some());
    }

    #[test]
    fn gateway_without_base_url_is_invalid() {
        let toml_src = r#"
            [providers.gateway]
            api_key = "gw-test"
        "#;
        let config: AppConfig = toml::from_str(toml_src).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_embeddings_section_stays_none() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.embeddings.is_none());
    }

    #[test]
    fn debug_redacts_api_keys() {
        let toml_src = r#"
            [providers.anthropic]
            api_key = "sk-ant-super-secret"
        "#;
        let config: AppConfig = toml::from_str(toml_src).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8420);
        assert_eq!(config.database.url, "respondo.db");
        assert!(config.providers.is_empty());
    }
}
