use crate::constants::routing;
use crate::error::{MindError, Result};
use crate::llm::provider::{ProviderId, ProviderRegistry};
use crate::llm::traits::ProviderAdapter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The kind of prompt, used to pick a provider when none is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Programming questions
    CodeSpecialist,
    /// Stories and other creative writing
    Creative,
    /// Short general questions
    GeneralShort,
    /// Everything else
    GeneralDefault,
}

/// Keyword lists, threshold and targets of the auto-router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRules {
    pub code_keywords: Vec<String>,
    pub creative_keywords: Vec<String>,
    /// Prompts shorter than this many characters count as short.
    pub short_prompt_chars: usize,
    pub code_provider: ProviderId,
    pub creative_provider: ProviderId,
    pub short_provider: ProviderId,
    pub default_provider: ProviderId,
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            code_keywords: routing::CODE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            creative_keywords: routing::CREATIVE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            short_prompt_chars: routing::SHORT_PROMPT_CHARS,
            code_provider: ProviderId::DeepSeek,
            creative_provider: ProviderId::Claude,
            short_provider: ProviderId::Gemini,
            default_provider: ProviderId::ChatGpt,
        }
    }
}

impl RoutingRules {
    /// Classify a prompt. Rules are checked in order and the first match wins:
    /// code keywords, creative keywords, length, default.
    pub fn classify(&self, prompt: &str) -> RouteClass {
        let lower = prompt.to_lowercase();

        if contains_any(&lower, &self.code_keywords) {
            return RouteClass::CodeSpecialist;
        }

        if contains_any(&lower, &self.creative_keywords) {
            return RouteClass::Creative;
        }

        if prompt.chars().count() < self.short_prompt_chars {
            return RouteClass::GeneralShort;
        }

        RouteClass::GeneralDefault
    }

    pub fn target(&self, class: RouteClass) -> ProviderId {
        match class {
            RouteClass::CodeSpecialist => self.code_provider,
            RouteClass::Creative => self.creative_provider,
            RouteClass::GeneralShort => self.short_provider,
            RouteClass::GeneralDefault => self.default_provider,
        }
    }
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}

/// Picks the provider that answers a prompt.
pub struct ProviderRouter {
    registry: Arc<ProviderRegistry>,
    rules: RoutingRules,
}

impl ProviderRouter {
    pub fn new(registry: Arc<ProviderRegistry>, rules: RoutingRules) -> Self {
        Self { registry, rules }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// Resolve the provider for `prompt`.
    ///
    /// An `explicit` provider wins only when it is registered, i.e. its
    /// name parses and it has an API key. A name that parses but has no
    /// adapter is treated like an unknown name: the prompt is classified,
    /// and when the classified target is not registered either the
    /// registry default answers instead.
    pub fn route(&self, explicit: Option<&str>, prompt: &str) -> Result<ProviderId> {
        if self.registry.is_empty() {
            return Err(MindError::NoProviderSelected);
        }

        if let Some(name) = explicit.filter(|n| !n.trim().is_empty()) {
            match name.parse::<ProviderId>() {
                Ok(id) if self.registry.contains(id) => return Ok(id),
                Ok(id) => tracing::warn!(
                    "Provider {} requested but not registered, auto-routing instead",
                    id
                ),
                Err(e) => tracing::warn!("{}", e),
            }
        }

        let class = self.rules.classify(prompt);
        let target = self.rules.target(class);
        if self.registry.contains(target) {
            tracing::info!("Auto-route: {:?} -> {}", class, target);
            return Ok(target);
        }

        let fallback = self
            .registry
            .default_provider()
            .ok_or(MindError::NoProviderSelected)?;
        tracing::info!(
            "Auto-route: {:?} -> {} not configured, using {}",
            class,
            target,
            fallback
        );
        Ok(fallback)
    }

    /// Route and return the adapter in one step.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        prompt: &str,
    ) -> Result<Arc<dyn ProviderAdapter>> {
        let id = self.route(explicit, prompt)?;
        self.registry
            .get(id)
            .ok_or_else(|| MindError::UnknownProvider(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderConfig;

    fn full_registry() -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for id in ProviderId::all_builtin() {
            registry.register(ProviderConfig::builtin(*id).build_adapter("key"));
        }
        Arc::new(registry)
    }

    fn router() -> ProviderRouter {
        ProviderRouter::new(full_registry(), RoutingRules::default())
    }

    #[test]
    fn programming_keyword_goes_to_code_specialist() {
        assert_eq!(
            router().route(None, "اكتب لي كود بايثون").unwrap(),
            ProviderId::DeepSeek
        );
    }

    #[test]
    fn creative_keyword_goes_to_creative() {
        assert_eq!(router().route(None, "اكتب قصة قصيرة").unwrap(), ProviderId::Claude);
    }

    #[test]
    fn short_prompt_goes_to_general_short() {
        assert_eq!(router().route(None, "مرحبا").unwrap(), ProviderId::Gemini);
    }

    #[test]
    fn long_prompt_goes_to_default() {
        let prompt = "ما هي عاصمة فرنسا ".repeat(10);
        assert!(prompt.chars().count() >= 100);
        assert_eq!(router().route(None, &prompt).unwrap(), ProviderId::ChatGpt);
    }

    #[test]
    fn code_keyword_beats_short_length() {
        assert_eq!(
            RoutingRules::default().classify("كود"),
            RouteClass::CodeSpecialist
        );
    }

    #[test]
    fn explicit_choice_always_wins() {
        let r = router();
        assert_eq!(r.route(Some("claude"), "اكتب لي كود").unwrap(), ProviderId::Claude);
        assert_eq!(r.route(Some("claude"), "").unwrap(), ProviderId::Claude);
    }

    #[test]
    fn unknown_explicit_falls_back_to_classification() {
        assert_eq!(router().route(Some("llama"), "مرحبا").unwrap(), ProviderId::Gemini);
    }

    #[test]
    fn unregistered_explicit_is_auto_routed() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderConfig::builtin(ProviderId::OpenRouter).build_adapter("k"));
        let r = ProviderRouter::new(Arc::new(registry), RoutingRules::default());
        assert_eq!(
            r.route(Some("claude"), "اكتب قصة").unwrap(),
            ProviderId::OpenRouter
        );
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let rules = RoutingRules {
            code_keywords: vec!["Code".into()],
            ..RoutingRules::default()
        };
        assert_eq!(rules.classify("WRITE CODE NOW"), RouteClass::CodeSpecialist);
    }

    #[test]
    fn unconfigured_target_uses_registry_default() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderConfig::builtin(ProviderId::OpenRouter).build_adapter("k"));
        let r = ProviderRouter::new(Arc::new(registry), RoutingRules::default());
        assert_eq!(r.route(None, "مرحبا").unwrap(), ProviderId::OpenRouter);
    }

    #[test]
    fn empty_registry_is_a_configuration_error() {
        let r = ProviderRouter::new(Arc::new(ProviderRegistry::new()), RoutingRules::default());
        assert!(matches!(r.route(None, "hi"), Err(MindError::NoProviderSelected)));
    }
}
