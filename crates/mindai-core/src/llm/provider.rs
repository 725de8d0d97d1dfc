use crate::constants::{endpoints, models};
use crate::error::{MindError, Result};
use crate::llm::traits::ProviderAdapter;
use crate::llm::{ClaudeAdapter, GeminiAdapter, OpenAiCompatAdapter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Identifies a specific LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Unified gateway serving the primary vision model.
    OpenRouter,
    DeepSeek,
    ChatGpt,
    Claude,
    Gemini,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
            Self::DeepSeek => "deepseek",
            Self::ChatGpt => "chatgpt",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OpenRouter",
            Self::DeepSeek => "DeepSeek",
            Self::ChatGpt => "ChatGPT",
            Self::Claude => "Claude (Anthropic)",
            Self::Gemini => "Gemini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenRouter => endpoints::OPENROUTER_BASE_URL,
            Self::DeepSeek => endpoints::DEEPSEEK_BASE_URL,
            Self::ChatGpt => endpoints::OPENAI_BASE_URL,
            Self::Claude => endpoints::CLAUDE_BASE_URL,
            Self::Gemini => endpoints::GEMINI_BASE_URL,
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::ChatGpt => "CHATGPT_API_KEY",
            Self::Claude => "CLAUDE_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenRouter => models::DEFAULT_GATEWAY_MODEL,
            Self::DeepSeek => models::DEFAULT_DEEPSEEK_MODEL,
            Self::ChatGpt => models::DEFAULT_CHATGPT_MODEL,
            Self::Claude => models::DEFAULT_CLAUDE_MODEL,
            Self::Gemini => models::DEFAULT_GEMINI_MODEL,
        }
    }

    pub fn all_builtin() -> &'static [ProviderId] {
        &[
            Self::OpenRouter,
            Self::DeepSeek,
            Self::ChatGpt,
            Self::Claude,
            Self::Gemini,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = MindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" | "gateway" => Ok(Self::OpenRouter),
            "deepseek" => Ok(Self::DeepSeek),
            "chatgpt" | "openai" => Ok(Self::ChatGpt),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(MindError::UnknownProvider(other.to_string())),
        }
    }
}

/// Configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub enabled: bool,
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn builtin(id: ProviderId) -> Self {
        Self {
            id,
            enabled: true,
            api_key_env: id.default_api_key_env().to_string(),
            base_url: id.default_base_url().to_string(),
            model: id.default_model().to_string(),
        }
    }

    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn is_available(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }

    /// Build the adapter for this provider with an explicit key.
    pub fn build_adapter(&self, api_key: impl Into<String>) -> Arc<dyn ProviderAdapter> {
        let api_key = api_key.into();
        match self.id {
            ProviderId::OpenRouter => Arc::new(
                OpenAiCompatAdapter::openrouter(api_key)
                    .with_model(&self.model)
                    .with_base_url(&self.base_url),
            ),
            ProviderId::DeepSeek | ProviderId::ChatGpt => Arc::new(
                OpenAiCompatAdapter::new(self.id, api_key)
                    .with_model(&self.model)
                    .with_base_url(&self.base_url),
            ),
            ProviderId::Claude => Arc::new(
                ClaudeAdapter::new(api_key)
                    .with_model(&self.model)
                    .with_base_url(&self.base_url),
            ),
            ProviderId::Gemini => Arc::new(
                GeminiAdapter::new(api_key)
                    .with_model(&self.model)
                    .with_base_url(&self.base_url),
            ),
        }
    }
}

/// Every configured provider, keyed by id.
pub struct ProviderRegistry {
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
    default_provider: Option<ProviderId>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            default_provider: None,
        }
    }

    /// Register every available provider from `configs`.
    ///
    /// Disabled providers and providers whose key variable is unset are
    /// skipped.
    pub fn from_configs(configs: &[ProviderConfig]) -> Self {
        let mut registry = Self::new();
        for config in configs {
            if !config.enabled {
                tracing::debug!("Provider {} disabled", config.id);
                continue;
            }
            match config.api_key() {
                Some(key) => registry.register(config.build_adapter(key)),
                None => tracing::info!(
                    "Provider {} skipped: {} is not set",
                    config.id,
                    config.api_key_env
                ),
            }
        }
        registry
    }

    /// Add or replace an adapter. The first one registered becomes the default.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let id = adapter.id();
        if self.default_provider.is_none() {
            self.default_provider = Some(id);
        }
        self.adapters.insert(id, adapter);
    }

    pub fn set_default(&mut self, id: ProviderId) -> Result<()> {
        if !self.adapters.contains_key(&id) {
            return Err(MindError::UnknownProvider(id.to_string()));
        }
        self.default_provider = Some(id);
        Ok(())
    }

    pub fn default_provider(&self) -> Option<ProviderId> {
        self.default_provider
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&id).cloned()
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.adapters.contains_key(&id)
    }

    /// Configured provider ids in a stable order.
    pub fn ids(&self) -> Vec<ProviderId> {
        ProviderId::all_builtin()
            .iter()
            .copied()
            .filter(|id| self.adapters.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_parse_aliases() {
        assert_eq!("claude".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("OpenAI".parse::<ProviderId>().unwrap(), ProviderId::ChatGpt);
        assert_eq!(" gemini ".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert!(matches!(
            "llama".parse::<ProviderId>(),
            Err(MindError::UnknownProvider(name)) if name == "llama"
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for id in ProviderId::all_builtin() {
            assert_eq!(id.to_string().parse::<ProviderId>().unwrap(), *id);
        }
    }

    #[test]
    fn first_registered_is_default() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        registry.register(ProviderConfig::builtin(ProviderId::Gemini).build_adapter("k1"));
        registry.register(ProviderConfig::builtin(ProviderId::Claude).build_adapter("k2"));

        assert_eq!(registry.default_provider(), Some(ProviderId::Gemini));
        assert_eq!(registry.ids(), vec![ProviderId::Claude, ProviderId::Gemini]);
        assert!(registry.set_default(ProviderId::DeepSeek).is_err());
        registry.set_default(ProviderId::Claude).unwrap();
        assert_eq!(registry.default_provider(), Some(ProviderId::Claude));
    }

    #[test]
    fn from_configs_skips_missing_keys_and_disabled() {
        std::env::set_var("MINDAI_TEST_REGISTRY_KEY", "secret");
        let mut with_key = ProviderConfig::builtin(ProviderId::DeepSeek);
        with_key.api_key_env = "MINDAI_TEST_REGISTRY_KEY".into();
        let mut disabled = ProviderConfig::builtin(ProviderId::Claude);
        disabled.api_key_env = "MINDAI_TEST_REGISTRY_KEY".into();
        disabled.enabled = false;
        let mut no_key = ProviderConfig::builtin(ProviderId::Gemini);
        no_key.api_key_env = "MINDAI_TEST_REGISTRY_UNSET".into();

        let registry = ProviderRegistry::from_configs(&[with_key, disabled, no_key]);
        assert_eq!(registry.ids(), vec![ProviderId::DeepSeek]);
        assert_eq!(registry.get(ProviderId::DeepSeek).unwrap().model(), "deepseek-chat");

        std::env::remove_var("MINDAI_TEST_REGISTRY_KEY");
    }
}
