use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::providers::catalog::{ModelCatalog, ModelRestriction, ModelSpec};
use crate::providers::openai::OpenAiCompatibleClient;
use crate::providers::options::ProviderOptions;
use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};

/// Self-hosted OpenAI-compatible endpoint (Ollama, vLLM, LM Studio, ...).
///
/// With a configured catalog only those models (and aliases) are accepted.
/// Without one, any bare local model name is, while `vendor/model`
/// identifiers are left for OpenRouter.
#[derive(Debug, Clone)]
pub struct CustomProvider {
    catalog: ModelCatalog,
    restriction: ModelRestriction,
    client: OpenAiCompatibleClient,
}

impl CustomProvider {
    pub fn new(
        api_key: &str,
        base_url: &str,
        models: Vec<ModelSpec>,
        options: &ProviderOptions,
    ) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(Error::Config(
                "custom provider requires a base URL".to_owned(),
            ));
        }

        tracing::debug!(base_url, models = models.len(), "building custom provider");
        Ok(Self {
            catalog: ModelCatalog::new(models),
            restriction: ModelRestriction::new(&options.allowed_models),
            client: OpenAiCompatibleClient::new(
                ProviderType::Custom,
                base_url,
                Some(api_key),
                options,
            )?,
        })
    }
}

#[async_trait]
impl ModelProvider for CustomProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Custom
    }

    fn validate_model_name(&self, model_name: &str) -> bool {
        let model_name = model_name.trim();
        if self.catalog.is_empty() {
            return !model_name.is_empty()
                && !model_name.contains('/')
                && self.restriction.allows(model_name, model_name);
        }
        self.catalog
            .find(model_name)
            .is_some_and(|spec| self.restriction.allows(&spec.model_name, model_name))
    }

    fn resolve_model_name(&self, model_name: &str) -> String {
        self.catalog
            .canonical_name(model_name)
            .unwrap_or(model_name.trim())
            .to_owned()
    }

    fn list_models(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|spec| self.restriction.allows_spec(spec))
            .map(|spec| spec.model_name.clone())
            .collect()
    }

    fn model_catalog(&self) -> Option<&ModelCatalog> {
        Some(&self.catalog)
    }

    async fn generate(
        &self,
        model_name: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String> {
        if !self.validate_model_name(model_name) {
            return Err(Error::Validation(format!(
                "model '{model_name}' is not available from the custom endpoint"
            )));
        }
        let model = self.resolve_model_name(model_name);
        self.client.chat(&model, messages, options, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::CustomProvider;
    use crate::providers::catalog::ModelSpec;
    use crate::providers::options::ProviderOptions;
    use crate::providers::types::ModelProvider;

    #[test]
    fn empty_catalog_accepts_local_names_only() {
        let provider = CustomProvider::new(
            "",
            "http://localhost:11434/v1",
            Vec::new(),
            &ProviderOptions::default(),
        )
        .expect("provider");
        assert!(provider.validate_model_name("llama3.2"));
        assert!(!provider.validate_model_name("anthropic/claude-3.5-sonnet"));
        assert!(provider.list_models().is_empty());
    }

    #[test]
    fn catalog_limits_models_and_resolves_aliases() {
        let provider = CustomProvider::new(
            "local-key",
            "http://localhost:8000/v1",
            vec![
                ModelSpec::new("llama3.2", 128_000).with_aliases(&["local-llama"]),
                ModelSpec::new("deepseek-r1", 64_000).with_extended_thinking(),
            ],
            &ProviderOptions::default(),
        )
        .expect("provider");

        assert!(provider.validate_model_name("Local-Llama"));
        assert_eq!(provider.resolve_model_name("local-llama"), "llama3.2");
        assert!(!provider.validate_model_name("mistral"));
        let thinking: Vec<&str> = provider
            .model_catalog()
            .expect("catalog")
            .iter()
            .filter(|spec| spec.supports_extended_thinking)
            .map(|spec| spec.model_name.as_str())
            .collect();
        assert_eq!(thinking, vec!["deepseek-r1"]);
        assert_eq!(
            provider.model_info("local-llama").map(|spec| spec.context_window),
            Some(128_000)
        );
    }

    #[test]
    fn blank_base_url_is_a_configuration_error() {
        let error = CustomProvider::new("", "  ", Vec::new(), &ProviderOptions::default())
            .expect_err("construction should fail");
        assert!(error.to_string().contains("requires a base URL"));
    }
}
