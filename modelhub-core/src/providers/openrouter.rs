use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::providers::catalog::ModelRestriction;
use crate::providers::openai::OpenAiCompatibleClient;
use crate::providers::options::ProviderOptions;
use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Catch-all for cloud models addressed as `vendor/model`.
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    allowed_models: Vec<String>,
    restriction: ModelRestriction,
    client: OpenAiCompatibleClient,
}

impl OpenRouterProvider {
    pub fn new(api_key: &str, options: &ProviderOptions) -> Result<Self> {
        let base_url = options.base_url_or(DEFAULT_OPENROUTER_BASE_URL);
        Ok(Self {
            allowed_models: options.allowed_models.clone(),
            restriction: ModelRestriction::new(&options.allowed_models),
            client: OpenAiCompatibleClient::new(
                ProviderType::OpenRouter,
                &base_url,
                Some(api_key),
                options,
            )?,
        })
    }

    fn is_routed_identifier(model_name: &str) -> bool {
        match model_name.split_once('/') {
            Some((vendor, model)) => !vendor.is_empty() && !model.is_empty(),
            None => false,
        }
    }
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenRouter
    }

    fn validate_model_name(&self, model_name: &str) -> bool {
        self.check_model_name(model_name).unwrap_or(false)
    }

    fn check_model_name(&self, model_name: &str) -> Result<bool> {
        let model_name = model_name.trim();
        if model_name.is_empty() || model_name.chars().any(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "'{model_name}' is not a valid OpenRouter model identifier"
            )));
        }
        Ok(Self::is_routed_identifier(model_name)
            && self.restriction.allows(model_name, model_name))
    }

    /// Only an explicit allow-list can be enumerated; OpenRouter's own
    /// catalogue is open-ended.
    fn list_models(&self) -> Vec<String> {
        self.allowed_models
            .iter()
            .map(|model| model.trim().to_owned())
            .filter(|model| Self::is_routed_identifier(model))
            .collect()
    }

    async fn generate(
        &self,
        model_name: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String> {
        if !self.check_model_name(model_name)? {
            return Err(Error::Validation(format!(
                "model '{model_name}' is not available from openrouter"
            )));
        }
        self.client
            .chat(model_name.trim(), messages, options, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::OpenRouterProvider;
    use crate::providers::options::ProviderOptions;
    use crate::providers::types::ModelProvider;

    #[test]
    fn accepts_vendor_prefixed_identifiers() {
        let provider =
            OpenRouterProvider::new("or-key", &ProviderOptions::default()).expect("provider");
        assert!(provider.validate_model_name("anthropic/claude-3.5-sonnet"));
        assert!(!provider.validate_model_name("o3"));
        assert!(!provider.validate_model_name("/missing-vendor"));
        assert!(provider.list_models().is_empty());
    }

    #[test]
    fn malformed_identifiers_fail_the_check() {
        let provider =
            OpenRouterProvider::new("or-key", &ProviderOptions::default()).expect("provider");
        assert!(provider.check_model_name("").is_err());
        assert!(provider.check_model_name("anthropic/claude 3").is_err());
        assert!(!provider.validate_model_name("anthropic/claude 3"));
    }

    #[test]
    fn allow_list_limits_routing() {
        let options = ProviderOptions {
            allowed_models: vec!["google/gemini-pro-1.5".to_owned()],
            ..ProviderOptions::default()
        };
        let provider = OpenRouterProvider::new("or-key", &options).expect("provider");
        assert!(provider.validate_model_name("google/gemini-pro-1.5"));
        assert!(!provider.validate_model_name("anthropic/claude-3.5-sonnet"));
        assert_eq!(
            provider.list_models(),
            vec!["google/gemini-pro-1.5".to_owned()]
        );
    }
}
