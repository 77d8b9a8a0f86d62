use std::sync::Arc;

use crate::config::schema::Config;
use crate::error::Error;
use crate::providers::binding::{ProviderBinding, ProviderHandle};
use crate::providers::custom::CustomProvider;
use crate::providers::google::GeminiProvider;
use crate::providers::openai::OpenAiProvider;
use crate::providers::openrouter::OpenRouterProvider;
use crate::providers::options::ProviderOptions;
use crate::providers::registry::ProviderRegistry;
use crate::providers::types::ProviderType;

/// Env-backed registry with every built-in provider registered.
pub fn create_provider_registry(config: &Config) -> ProviderRegistry {
    let registry = ProviderRegistry::from_env();
    register_default_providers(&registry, config);
    registry
}

pub fn register_default_providers(registry: &ProviderRegistry, config: &Config) {
    for provider_type in ProviderType::PRIORITY_ORDER {
        registry.register_provider(provider_type, default_binding(provider_type, config));
    }
}

pub fn default_binding(provider_type: ProviderType, config: &Config) -> ProviderBinding {
    let options = ProviderOptions::from_config(config, provider_type);

    match provider_type {
        ProviderType::Google => ProviderBinding::constructor(move |credentials| {
            Ok(Arc::new(GeminiProvider::new(&credentials.api_key, &options)?) as ProviderHandle)
        }),
        ProviderType::OpenAi => ProviderBinding::constructor(move |credentials| {
            Ok(Arc::new(OpenAiProvider::new(&credentials.api_key, &options)?) as ProviderHandle)
        }),
        ProviderType::OpenRouter => ProviderBinding::constructor(move |credentials| {
            Ok(Arc::new(OpenRouterProvider::new(&credentials.api_key, &options)?)
                as ProviderHandle)
        }),
        ProviderType::Custom => {
            let models = config.providers.custom.models.clone();
            ProviderBinding::constructor(move |credentials| {
                let base_url = credentials.base_url.as_deref().ok_or_else(|| {
                    Error::Config("custom provider requires CUSTOM_API_URL".to_owned())
                })?;
                Ok(Arc::new(CustomProvider::new(
                    &credentials.api_key,
                    base_url,
                    models.clone(),
                    &options,
                )?) as ProviderHandle)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::register_default_providers;
    use crate::category::ToolModelCategory;
    use crate::config::schema::Config;
    use crate::providers::catalog::ModelSpec;
    use crate::providers::credentials::StaticCredentials;
    use crate::providers::registry::ProviderRegistry;
    use crate::providers::types::ProviderType;

    fn registry(credentials: StaticCredentials, config: &Config) -> ProviderRegistry {
        let registry = ProviderRegistry::new(Arc::new(credentials));
        register_default_providers(&registry, config);
        registry
    }

    #[test]
    fn resolves_models_across_built_in_providers() {
        let registry = registry(
            StaticCredentials::new()
                .with("GEMINI_API_KEY", "gemini-key")
                .with("OPENAI_API_KEY", "openai-key")
                .with("OPENROUTER_API_KEY", "openrouter-key")
                .with("CUSTOM_API_URL", "http://localhost:11434/v1"),
            &Config::default(),
        );

        let resolved = |model: &str| {
            registry
                .provider_for_model(model)
                .expect("lookup")
                .map(|provider| provider.provider_type())
        };
        assert_eq!(resolved("flash"), Some(ProviderType::Google));
        assert_eq!(resolved("o3-mini"), Some(ProviderType::OpenAi));
        assert_eq!(resolved("llama3.2"), Some(ProviderType::Custom));
        assert_eq!(
            resolved("anthropic/claude-3-opus-20240229"),
            Some(ProviderType::OpenRouter)
        );
        assert_eq!(
            registry.available_providers_with_keys().expect("providers"),
            ProviderType::PRIORITY_ORDER.to_vec()
        );
    }

    #[test]
    fn custom_catalog_drives_reasoning_fallback() {
        let mut config = Config::default();
        config.providers.custom.models = vec![
            ModelSpec::new("llama3.2", 128_000),
            ModelSpec::new("qwq-32b", 32_000).with_extended_thinking(),
        ];
        let registry = registry(
            StaticCredentials::new().with("CUSTOM_API_URL", "http://localhost:11434/v1"),
            &config,
        );

        assert_eq!(
            registry
                .preferred_fallback_model(Some(ToolModelCategory::ExtendedReasoning))
                .expect("fallback"),
            "qwq-32b"
        );
        let models = registry.available_models().expect("models");
        assert_eq!(models.get("qwq-32b"), Some(&ProviderType::Custom));

        let custom = registry
            .provider_for_model("qwq-32b")
            .expect("lookup")
            .expect("custom serves qwq-32b");
        let spec = custom.model_info("qwq-32b").expect("catalog entry");
        assert_eq!(spec.context_window, 32_000);
        assert!(spec.description.is_none());
    }

    #[test]
    fn reasoning_fallback_respects_custom_allow_list() {
        let mut config = Config::default();
        config.providers.custom.models = vec![
            ModelSpec::new("llama3.2", 128_000),
            ModelSpec::new("deepseek-r1", 64_000).with_extended_thinking(),
        ];
        config.providers.custom.settings.allowed_models = vec!["llama3.2".to_owned()];
        let registry = registry(
            StaticCredentials::new().with("CUSTOM_API_URL", "http://localhost:11434/v1"),
            &config,
        );

        let fallback = registry
            .preferred_fallback_model(Some(ToolModelCategory::ExtendedReasoning))
            .expect("fallback");
        assert_eq!(fallback, "gemini-2.5-pro-preview-06-05");
        assert!(registry
            .provider_for_model("deepseek-r1")
            .expect("lookup")
            .is_none());
        assert_eq!(
            registry
                .provider_for_model("llama3.2")
                .expect("lookup")
                .map(|provider| provider.provider_type()),
            Some(ProviderType::Custom)
        );
    }

    #[test]
    fn openrouter_supplies_first_reasoning_candidate() {
        let registry = registry(
            StaticCredentials::new().with("OPENROUTER_API_KEY", "openrouter-key"),
            &Config::default(),
        );
        assert_eq!(
            registry
                .preferred_fallback_model(Some(ToolModelCategory::ExtendedReasoning))
                .expect("fallback"),
            "anthropic/claude-3.5-sonnet"
        );
        assert_eq!(
            registry
                .preferred_fallback_model(Some(ToolModelCategory::FastResponse))
                .expect("fallback"),
            "gemini-2.5-flash-preview-05-20"
        );
    }
}
