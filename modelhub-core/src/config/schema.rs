use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::providers::catalog::ModelSpec;
use crate::providers::retry::RetryPolicy;
use crate::providers::types::ProviderType;

/// Top-level `modelhub.toml`. Every section is optional; credentials are
/// never read from here, only from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub providers: ProvidersConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}

/// Chat threads live in memory unless `store_path` names a JSON file, which
/// lets `--continuation-id` work across separate CLI runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub ttl_secs: u64,
    pub store_path: Option<PathBuf>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3 * 60 * 60,
            store_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub google: ProviderSettings,
    pub openai: ProviderSettings,
    pub openrouter: ProviderSettings,
    pub custom: CustomProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            google: ProviderSettings::with_base_url(
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            openai: ProviderSettings::with_base_url("https://api.openai.com/v1"),
            openrouter: ProviderSettings::with_base_url("https://openrouter.ai/api/v1"),
            custom: CustomProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn settings(&self, provider_type: ProviderType) -> &ProviderSettings {
        match provider_type {
            ProviderType::Google => &self.google,
            ProviderType::OpenAi => &self.openai,
            ProviderType::OpenRouter => &self.openrouter,
            ProviderType::Custom => &self.custom.settings,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: Option<String>,
    /// Empty means every model the provider knows is allowed.
    pub allowed_models: Vec<String>,
    pub extra_headers: BTreeMap<String, String>,
}

impl ProviderSettings {
    fn with_base_url(url: &str) -> Self {
        Self {
            base_url: Some(url.to_owned()),
            ..Self::default()
        }
    }

    pub fn extra_header_pairs(&self) -> Vec<(String, String)> {
        self.extra_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// The custom endpoint comes from `CUSTOM_API_URL`; setting `base_url` in
/// this section is rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomProviderSettings {
    #[serde(flatten)]
    pub settings: ProviderSettings,
    pub models: Vec<ModelSpec>,
}
