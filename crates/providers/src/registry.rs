//! Enum-keyed provider registry.
//!
//! Built once from [`AppConfig`]; the responder resolves the provider named
//! on an agent profile through [`ProviderRegistry::get`]. An unconfigured
//! family is a typed `NotConfigured` error surfaced before any model call.

use crate::anthropic::AnthropicProvider;
use crate::openai::{OpenAiEmbedder, OpenAiProvider};
use respondo_config::AppConfig;
use respondo_core::Provider;
use respondo_core::error::ProviderError;
use respondo_core::profile::ProviderKind;
use respondo_core::provider::Embedder;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Fallback models when neither the profile nor the config names one.
fn builtin_default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        ProviderKind::OpenAi => "gpt-4o",
        ProviderKind::Gateway => "gpt-4o-mini",
    }
}

/// All configured providers, keyed by [`ProviderKind`].
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
    default_models: HashMap<ProviderKind, String>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl ProviderRegistry {
    /// Build the registry from configuration. Families without an API key
    /// (base URL for gateway) are simply absent.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut providers: HashMap<ProviderKind, Arc<dyn Provider>> = HashMap::new();
        let mut default_models = HashMap::new();

        for (&kind, pc) in &config.providers {
            let Some(api_key) = pc.api_key.as_deref().filter(|k| !k.is_empty()) else {
                continue;
            };

            let provider: Arc<dyn Provider> = match kind {
                ProviderKind::Anthropic => {
                    let mut p = AnthropicProvider::new(api_key);
                    if let Some(base_url) = &pc.base_url {
                        p = p.with_base_url(base_url);
                    }
                    Arc::new(p)
                }
                ProviderKind::OpenAi => match &pc.base_url {
                    Some(base_url) => Arc::new(OpenAiProvider::new("openai", base_url, api_key)),
                    None => Arc::new(OpenAiProvider::openai(api_key)),
                },
                ProviderKind::Gateway => {
                    let Some(base_url) = &pc.base_url else { continue };
                    Arc::new(OpenAiProvider::gateway(base_url, api_key))
                }
            };

            info!(provider = %kind, "Registered provider");
            providers.insert(kind, provider);
            if let Some(model) = &pc.default_model {
                default_models.insert(kind, model.clone());
            }
        }

        let embedder = config.embeddings.as_ref().and_then(|ec| {
            let api_key = ec.api_key.as_deref().filter(|k| !k.is_empty())?;
            info!(model = %ec.model, "Registered embedder");
            Some(Arc::new(OpenAiEmbedder::new(&ec.base_url, api_key, &ec.model))
                as Arc<dyn Embedder>)
        });

        Self { providers, default_models, embedder }
    }

    /// The provider for a family, or a typed `NotConfigured` error.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured(kind.to_string()))
    }

    /// The model to use for a family when the agent profile has no override.
    pub fn default_model(&self, kind: ProviderKind) -> String {
        self.default_models
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| builtin_default_model(kind).to_string())
    }

    /// The embedder, when embeddings are configured. `None` turns retrieval
    /// off without being an error.
    pub fn embedder(&self) -> Option<Arc<dyn Embedder>> {
        self.embedder.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respondo_config::{EmbeddingsConfig, ProviderConfig};

    fn config_with(entries: Vec<(ProviderKind, ProviderConfig)>) -> AppConfig {
        let mut config = AppConfig::default();
        config.providers = entries.into_iter().collect();
        config
    }

    #[test]
    fn registers_configured_families_only() {
        let config = config_with(vec![
            (
                ProviderKind::Anthropic,
                ProviderConfig {
                    api_key: Some("sk-ant-test".into()),
                    base_url: None,
                    default_model: Some("claude-sonnet-4-20250514".into()),
                },
            ),
            (
                ProviderKind::OpenAi,
                ProviderConfig { api_key: None, base_url: None, default_model: None },
            ),
        ]);

        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.get(ProviderKind::Anthropic).is_ok());
        assert!(matches!(
            registry.get(ProviderKind::OpenAi),
            Err(ProviderError::NotConfigured(_))
        ));
        assert!(matches!(
            registry.get(ProviderKind::Gateway),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn gateway_requires_base_url() {
        let config = config_with(vec![(
            ProviderKind::Gateway,
            ProviderConfig { api_key: Some("key".into()), base_url: None, default_model: None },
        )]);
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.get(ProviderKind::Gateway).is_err());
    }

    #[test]
    fn default_model_prefers_config_then_builtin() {
        let config = config_with(vec![(
            ProviderKind::Anthropic,
            ProviderConfig {
                api_key: Some("sk-ant-test".into()),
                base_url: None,
                default_model: Some("claude-opus-4".into()),
            },
        )]);
        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.default_model(ProviderKind::Anthropic), "claude-opus-4");
        assert_eq!(registry.default_model(ProviderKind::OpenAi), "gpt-4o");
    }

    #[test]
    fn embedder_absent_without_api_key() {
        let mut config = AppConfig::default();
        config.embeddings = Some(EmbeddingsConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "text-embedding-3-small".into(),
        });
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.embedder().is_none());
        assert!(registry.is_empty());
    }
}
