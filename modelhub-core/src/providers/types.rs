use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::providers::catalog::{ModelCatalog, ModelSpec};

/// Vendor identity of a provider. Used as the registry key everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "custom")]
    Custom,
}

impl ProviderType {
    /// Resolution order for model lookups: native APIs, then local/self-hosted
    /// endpoints, then the catch-all aggregator.
    pub const PRIORITY_ORDER: [ProviderType; 4] = [
        ProviderType::Google,
        ProviderType::OpenAi,
        ProviderType::Custom,
        ProviderType::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Custom => "custom",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Google => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Custom => "CUSTOM_API_KEY",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "custom" => Ok(Self::Custom),
            other => Err(Error::Validation(format!("unknown provider type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 4_096,
        }
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Whether this provider can serve `model_name` (canonical name or alias).
    fn validate_model_name(&self, model_name: &str) -> bool;

    /// Fallible variant of [`validate_model_name`](Self::validate_model_name)
    /// for providers that can reject malformed identifiers outright.
    fn check_model_name(&self, model_name: &str) -> Result<bool> {
        Ok(self.validate_model_name(model_name))
    }

    fn resolve_model_name(&self, model_name: &str) -> String {
        model_name.to_owned()
    }

    /// Canonical names of every model this provider currently allows.
    fn list_models(&self) -> Vec<String>;

    /// Introspectable model table. Providers with an open-ended catalogue
    /// (OpenRouter) have none.
    fn model_catalog(&self) -> Option<&ModelCatalog> {
        None
    }

    /// Catalog entry for `model_name` (canonical name or alias), if allowed.
    fn model_info(&self, model_name: &str) -> Option<&ModelSpec> {
        if !self.validate_model_name(model_name) {
            return None;
        }
        self.model_catalog()
            .and_then(|catalog| catalog.find(model_name))
    }

    async fn generate(
        &self,
        model_name: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::ProviderType;

    #[test]
    fn priority_order_puts_openrouter_last() {
        assert_eq!(
            ProviderType::PRIORITY_ORDER,
            [
                ProviderType::Google,
                ProviderType::OpenAi,
                ProviderType::Custom,
                ProviderType::OpenRouter,
            ]
        );
    }

    #[test]
    fn maps_each_type_to_its_key_variable() {
        assert_eq!(ProviderType::Google.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(ProviderType::OpenAi.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(ProviderType::OpenRouter.api_key_env(), "OPENROUTER_API_KEY");
        assert_eq!(ProviderType::Custom.api_key_env(), "CUSTOM_API_KEY");
    }

    #[test]
    fn parses_display_names_back() {
        for provider_type in ProviderType::PRIORITY_ORDER {
            let parsed: ProviderType = provider_type.to_string().parse().expect("round trip");
            assert_eq!(parsed, provider_type);
        }
        assert_eq!("Gemini".parse::<ProviderType>().ok(), Some(ProviderType::Google));
    }
}
