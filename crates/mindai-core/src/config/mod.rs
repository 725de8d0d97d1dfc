use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{chat, paths, server};
use crate::context::{ConversationStore, FileKvStore, MessageComposer, SystemPromptBuilder};
use crate::error::{MindError, Result};
use crate::llm::{ProviderConfig, ProviderId, ProviderRegistry, ProviderRouter, ReqwestTransport, RoutingRules};
use crate::orchestrator::Orchestrator;
use crate::render::Renderer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub routing: RoutingRules,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Replaces the built-in study-helper persona when set.
    pub system_prompt: Option<String>,
    pub window_size: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub restore_limit: usize,
    /// Provider for every turn of the conversation; empty means auto-route.
    pub provider: String,
}

/// A provider override in settings. Unset fields keep the built-in value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Defaults to `<data_dir>/mindai`.
    pub data_dir: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    chat::REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: None,
            window_size: chat::WINDOW_SIZE,
            temperature: chat::TEMPERATURE,
            max_tokens: chat::MAX_TOKENS,
            restore_limit: chat::RESTORE_LIMIT,
            provider: ProviderId::OpenRouter.as_str().to_string(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: server::DEFAULT_BIND.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            chat: ChatSettings::default(),
            providers: Vec::new(),
            routing: RoutingRules::default(),
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Missing or unparsable files yield the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| MindError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Built-in provider configs with the overrides from `providers` applied.
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        let mut configs: Vec<ProviderConfig> = ProviderId::all_builtin()
            .iter()
            .map(|id| ProviderConfig::builtin(*id))
            .collect();

        for entry in &self.providers {
            let id = match entry.name.parse::<ProviderId>() {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Ignoring provider entry: {}", e);
                    continue;
                }
            };
            if let Some(config) = configs.iter_mut().find(|c| c.id == id) {
                config.enabled = entry.enabled;
                if let Some(env) = &entry.api_key_env {
                    config.api_key_env = env.clone();
                }
                if let Some(url) = &entry.base_url {
                    config.base_url = url.clone();
                }
                if let Some(model) = &entry.model {
                    config.model = model.clone();
                }
            }
        }
        configs
    }

    /// Registry of every provider that is enabled and has a key.
    pub fn build_provider_registry(&self) -> ProviderRegistry {
        ProviderRegistry::from_configs(&self.provider_configs())
    }

    pub fn build_router(&self) -> Arc<ProviderRouter> {
        Arc::new(ProviderRouter::new(
            Arc::new(self.build_provider_registry()),
            self.routing.clone(),
        ))
    }

    pub fn build_transport(&self) -> ReqwestTransport {
        ReqwestTransport::with_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn build_composer(&self) -> MessageComposer {
        let mut prompt = SystemPromptBuilder::new();
        if let Some(persona) = &self.chat.system_prompt {
            prompt = prompt.with_persona(persona);
        }
        MessageComposer::new()
            .with_system_prompt(prompt.build())
            .with_window_size(self.chat.window_size)
            .with_temperature(self.chat.temperature)
            .with_max_tokens(self.chat.max_tokens)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileKvStore::default_dir(),
        }
    }

    /// Bind address, with the port replaced by `PORT` when that is set.
    pub fn bind_address(&self) -> String {
        with_port(&self.server.bind, std::env::var("PORT").ok().as_deref())
    }

    /// Wire everything up for one conversation rendered through `renderer`.
    pub fn build_orchestrator(&self, renderer: Arc<dyn Renderer>) -> Result<Orchestrator> {
        let kv = FileKvStore::with_dir(self.data_dir()?)?;
        let store = ConversationStore::new(Arc::new(kv));
        Ok(Orchestrator::new(
            self.build_router(),
            Arc::new(self.build_transport()),
            renderer,
            store,
        )?
        .with_composer(self.build_composer())
        .with_provider(Some(self.chat.provider.clone()))
        .with_restore_limit(self.chat.restore_limit))
    }
}

fn with_port(bind: &str, port: Option<&str>) -> String {
    let Some(port) = port.map(str::trim).filter(|p| p.parse::<u16>().is_ok()) else {
        return bind.to_string();
    };
    let host = bind.rsplit_once(':').map(|(host, _)| host).unwrap_or(bind);
    format!("{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_chat_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chat.window_size, 10);
        assert_eq!(settings.chat.restore_limit, 50);
        assert_eq!(settings.chat.max_tokens, 4000);
        assert_eq!(settings.chat.provider, "openrouter");
        assert_eq!(settings.request_timeout_secs, 60);
        assert_eq!(settings.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chat]
            provider = ""

            [routing]
            short_prompt_chars = 40

            [[providers]]
            name = "claude"
            model = "claude-3-haiku-20240307"
            "#,
        )
        .unwrap();

        assert_eq!(settings.chat.provider, "");
        assert_eq!(settings.chat.window_size, 10);
        assert_eq!(settings.routing.short_prompt_chars, 40);
        assert_eq!(settings.routing.code_provider, ProviderId::DeepSeek);
        assert!(settings.providers[0].enabled);
    }

    #[test]
    fn provider_overrides_apply_to_builtins() {
        let settings = Settings {
            providers: vec![
                ProviderEntry {
                    name: "anthropic".into(),
                    enabled: false,
                    api_key_env: None,
                    base_url: None,
                    model: Some("claude-3-haiku-20240307".into()),
                },
                ProviderEntry {
                    name: "mistral".into(),
                    enabled: true,
                    api_key_env: None,
                    base_url: None,
                    model: None,
                },
            ],
            ..Settings::default()
        };

        let configs = settings.provider_configs();
        assert_eq!(configs.len(), 5);
        let claude = configs.iter().find(|c| c.id == ProviderId::Claude).unwrap();
        assert!(!claude.enabled);
        assert_eq!(claude.model, "claude-3-haiku-20240307");
        assert_eq!(claude.api_key_env, "CLAUDE_API_KEY");
    }

    #[test]
    fn port_override() {
        assert_eq!(with_port("0.0.0.0:3000", Some("8080")), "0.0.0.0:8080");
        assert_eq!(with_port("0.0.0.0:3000", None), "0.0.0.0:3000");
        assert_eq!(with_port("0.0.0.0:3000", Some("nope")), "0.0.0.0:3000");
    }
}
