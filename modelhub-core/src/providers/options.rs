use crate::config::schema::Config;
use crate::providers::retry::RetryPolicy;
use crate::providers::types::ProviderType;

/// Per-provider client settings resolved from [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub retry_policy: RetryPolicy,
    pub extra_headers: Vec<(String, String)>,
    pub allowed_models: Vec<String>,
}

impl ProviderOptions {
    pub fn from_config(config: &Config, provider_type: ProviderType) -> Self {
        let settings = config.providers.settings(provider_type);
        Self {
            base_url: settings.base_url.clone(),
            timeout_ms: config.http.timeout_ms,
            retry_policy: config.http.retry.clone(),
            extra_headers: settings.extra_header_pairs(),
            allowed_models: settings.allowed_models.clone(),
        }
    }

    pub(crate) fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_owned()
    }
}
