//! Provider selection for the LLM strategies.
//!
//! Providers are a closed set plus an explicit registration mechanism; the
//! rest of the CLI never dispatches on free-form strings.

use std::sync::Arc;

use scaffold_core::{AnalysisStrategy, FixStrategy, GenerationStrategy};

use super::llm::{LlmAnalyzer, LlmFixer, LlmGenerator};
use crate::config::ModelSettings;
use crate::llm::LlmClient;

/// Known model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

impl Provider {
    /// The registry name of this provider
    pub fn name(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
        }
    }
}

/// The three strategies a provider contributes to a session.
pub struct StrategySet {
    pub generator: Arc<dyn GenerationStrategy>,
    pub analyzer: Arc<dyn AnalysisStrategy>,
    pub fixer: Arc<dyn FixStrategy>,
}

/// Builds a strategy set from model settings and an API key.
pub type StrategyFactory = Box<dyn Fn(&ModelSettings, &str) -> StrategySet + Send + Sync>;

/// Explicit mapping from provider names to strategy factories.
pub struct StrategyRegistry {
    entries: Vec<(String, StrategyFactory)>,
}

impl StrategyRegistry {
    /// Registry with the built-in providers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
        };
        registry.register(Provider::Anthropic.name(), Box::new(anthropic_factory));
        registry
    }

    /// Register a provider. A repeated name shadows the earlier entry.
    pub fn register(&mut self, name: impl Into<String>, factory: StrategyFactory) {
        self.entries.insert(0, (name.into(), factory));
    }

    /// Build the strategy set for a named provider, if registered.
    pub fn build(&self, name: &str, settings: &ModelSettings, api_key: &str) -> Option<StrategySet> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, factory)| factory(settings, api_key))
    }

    /// Names of all registered providers.
    pub fn providers(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

fn anthropic_factory(settings: &ModelSettings, api_key: &str) -> StrategySet {
    let client = LlmClient::new(api_key, &settings.name, settings.max_tokens);
    StrategySet {
        generator: Arc::new(LlmGenerator::new(client.clone())),
        analyzer: Arc::new(LlmAnalyzer::new(client.clone())),
        fixer: Arc::new(LlmFixer::new(client)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_knows_anthropic() {
        let registry = StrategyRegistry::with_defaults();
        assert!(registry.providers().contains(&"anthropic"));

        let set = registry.build("anthropic", &ModelSettings::default(), "key");
        assert!(set.is_some());
    }

    #[test]
    fn test_unknown_provider_is_none() {
        let registry = StrategyRegistry::with_defaults();
        assert!(registry
            .build("made-up", &ModelSettings::default(), "key")
            .is_none());
    }

    #[test]
    fn test_registered_provider_shadows_builtin() {
        let mut registry = StrategyRegistry::with_defaults();
        registry.register("anthropic", Box::new(anthropic_factory));
        // Both entries exist; the newest wins on lookup.
        assert_eq!(
            registry
                .providers()
                .iter()
                .filter(|name| **name == "anthropic")
                .count(),
            2
        );
        assert!(registry
            .build("anthropic", &ModelSettings::default(), "key")
            .is_some());
    }
}
