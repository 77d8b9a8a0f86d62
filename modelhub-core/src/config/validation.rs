use std::collections::HashSet;

use crate::config::schema::{Config, ProviderSettings};
use crate::error::{Error, Result};
use crate::providers::types::ProviderType;

pub fn validate_config(config: &Config) -> Result<()> {
    if config.logging.level.trim().is_empty() {
        return Err(Error::Validation(
            "logging.level cannot be empty".to_owned(),
        ));
    }

    if config.conversation.ttl_secs == 0 {
        return Err(Error::Validation(
            "conversation.ttl_secs must be greater than zero".to_owned(),
        ));
    }

    for provider_type in ProviderType::PRIORITY_ORDER {
        validate_provider_settings(provider_type, config.providers.settings(provider_type))?;
    }

    if config.providers.custom.settings.base_url.is_some() {
        return Err(Error::Validation(
            "providers.custom.base_url is not supported; set CUSTOM_API_URL instead".to_owned(),
        ));
    }

    let mut model_names = HashSet::new();
    for model in &config.providers.custom.models {
        let name = model.model_name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "custom model name cannot be empty".to_owned(),
            ));
        }

        for key in std::iter::once(name).chain(model.aliases.iter().map(|alias| alias.trim())) {
            if key.is_empty() {
                return Err(Error::Validation(format!(
                    "custom model '{name}' has an empty alias"
                )));
            }
            if !model_names.insert(key.to_ascii_lowercase()) {
                return Err(Error::Validation(format!(
                    "duplicate custom model name or alias '{key}'"
                )));
            }
        }
    }

    Ok(())
}

fn validate_provider_settings(provider_type: ProviderType, settings: &ProviderSettings) -> Result<()> {
    if let Some(url) = &settings.base_url {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Validation(format!(
                "providers.{provider_type}.base_url must start with http:// or https:// (got '{url}')"
            )));
        }
    }

    if settings
        .allowed_models
        .iter()
        .any(|model| model.trim().is_empty())
    {
        return Err(Error::Validation(format!(
            "providers.{provider_type}.allowed_models cannot contain empty entries"
        )));
    }

    if settings
        .extra_headers
        .keys()
        .any(|name| name.trim().is_empty())
    {
        return Err(Error::Validation(format!(
            "providers.{provider_type}.extra_headers cannot contain an empty header name"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_config;
    use crate::config::schema::Config;
    use crate::providers::catalog::ModelSpec;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.providers.custom.models.push(ModelSpec {
            model_name: "llama3.2".to_owned(),
            aliases: vec!["local-llama".to_owned()],
            context_window: 128_000,
            supports_extended_thinking: false,
            description: None,
        });
        config
    }

    #[test]
    fn accepts_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let mut config = valid_config();
        config.providers.openrouter.base_url = Some("openrouter.ai/api/v1".to_owned());

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error
            .to_string()
            .contains("providers.openrouter.base_url must start with"));
    }

    #[test]
    fn rejects_alias_colliding_with_model_name() {
        let mut config = valid_config();
        config.providers.custom.models.push(ModelSpec {
            model_name: "mistral".to_owned(),
            aliases: vec!["LLAMA3.2".to_owned()],
            context_window: 32_000,
            supports_extended_thinking: false,
            description: None,
        });

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("duplicate custom model name"));
    }

    #[test]
    fn rejects_blank_allow_list_entry() {
        let mut config = valid_config();
        config.providers.google.allowed_models = vec!["flash".to_owned(), " ".to_owned()];

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("allowed_models cannot contain empty"));
    }

    #[test]
    fn rejects_custom_base_url_in_config() {
        let mut config = valid_config();
        config.providers.custom.settings.base_url = Some("http://localhost:11434/v1".to_owned());

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("set CUSTOM_API_URL instead"));
    }

    #[test]
    fn rejects_zero_conversation_ttl() {
        let mut config = valid_config();
        config.conversation.ttl_secs = 0;

        let error = validate_config(&config).expect_err("validation should fail");
        assert!(error.to_string().contains("conversation.ttl_secs"));
    }
}
