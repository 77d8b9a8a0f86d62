use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::providers::catalog::{ModelCatalog, ModelRestriction, ModelSpec};
use crate::providers::http_client::{build_client, default_headers};
use crate::providers::options::ProviderOptions;
use crate::providers::retry::{send_with_retry, RetryPolicy};
use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client shared by every OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    provider_type: ProviderType,
    endpoint: String,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(
        provider_type: ProviderType,
        base_url: &str,
        api_key: Option<&str>,
        options: &ProviderOptions,
    ) -> Result<Self> {
        let headers = default_headers(provider_type, api_key, &options.extra_headers)?;
        let client = build_client(provider_type, headers, options.timeout_ms)?;

        Ok(Self {
            provider_type,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
            retry_policy: options.retry_policy.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn payload(
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
        send_temperature: bool,
    ) -> Value {
        let mut payload = json!({
            "model": model,
            "messages": messages,
            "max_tokens": options.max_tokens,
        });
        if send_temperature {
            payload["temperature"] = json!(options.temperature);
        }
        payload
    }

    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
        send_temperature: bool,
    ) -> Result<String> {
        let label = self.provider_type;
        let request = self
            .client
            .post(&self.endpoint)
            .json(&Self::payload(model, messages, options, send_temperature));

        let response =
            send_with_retry(request, &self.retry_policy, &format!("{label} request")).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(Error::Provider(format!(
                "{label} request failed with status {status}: {body}"
            )));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| Error::Provider(format!("failed to parse {label} response: {err}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Provider(format!("{label} returned no choices")))
    }
}

pub(crate) fn openai_models() -> ModelCatalog {
    ModelCatalog::new(vec![
        ModelSpec::new("o3", 200_000)
            .with_extended_thinking()
            .with_description("Strong reasoning for logical problems and code"),
        ModelSpec::new("o3-mini", 200_000)
            .with_aliases(&["o3mini"])
            .with_description("Fast o3 variant balancing speed and reasoning"),
        ModelSpec::new("o3-pro", 200_000)
            .with_aliases(&["o3pro"])
            .with_extended_thinking()
            .with_description("Professional-grade reasoning, slow and expensive"),
        ModelSpec::new("o4-mini", 200_000)
            .with_aliases(&["mini", "o4mini"])
            .with_description("Latest compact reasoning model, optimized for speed"),
        ModelSpec::new("gpt-4.1", 1_000_000)
            .with_aliases(&["gpt4.1"])
            .with_description("Long-context general model"),
    ])
}

/// Reasoning models reject a caller-supplied temperature.
fn accepts_temperature(model: &str) -> bool {
    !(model.starts_with("o3") || model.starts_with("o4"))
}

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    catalog: ModelCatalog,
    restriction: ModelRestriction,
    client: OpenAiCompatibleClient,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, options: &ProviderOptions) -> Result<Self> {
        let base_url = options.base_url_or(DEFAULT_OPENAI_BASE_URL);
        Ok(Self {
            catalog: openai_models(),
            restriction: ModelRestriction::new(&options.allowed_models),
            client: OpenAiCompatibleClient::new(
                ProviderType::OpenAi,
                &base_url,
                Some(api_key),
                options,
            )?,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
    }

    fn validate_model_name(&self, model_name: &str) -> bool {
        self.catalog
            .find(model_name)
            .is_some_and(|spec| self.restriction.allows(&spec.model_name, model_name.trim()))
    }

    fn resolve_model_name(&self, model_name: &str) -> String {
        self.catalog
            .canonical_name(model_name)
            .unwrap_or(model_name)
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
                "model '{model_name}' is not available from openai"
            )));
        }
        let model = self.resolve_model_name(model_name);
        self.client
            .chat(&model, messages, options, accepts_temperature(&model))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenAiCompatibleClient, OpenAiProvider};
    use crate::providers::options::ProviderOptions;
    use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};

    #[test]
    fn validates_names_and_aliases() {
        let provider = OpenAiProvider::new("sk-test", &ProviderOptions::default()).expect("provider");
        assert!(provider.validate_model_name("o3"));
        assert!(provider.validate_model_name("MINI"));
        assert_eq!(provider.resolve_model_name("mini"), "o4-mini");
        assert!(!provider.validate_model_name("gemini-2.5-flash-preview-05-20"));
        assert!(!provider.validate_model_name("openai/o3"));
    }

    #[test]
    fn allow_list_restricts_validation_and_listing() {
        let options = ProviderOptions {
            allowed_models: vec!["o3-mini".to_owned(), "mini".to_owned()],
            ..ProviderOptions::default()
        };
        let provider = OpenAiProvider::new("sk-test", &options).expect("provider");
        assert!(provider.validate_model_name("o3-mini"));
        assert!(provider.validate_model_name("mini"));
        assert!(!provider.validate_model_name("o3"));
        assert_eq!(
            provider.list_models(),
            vec!["o3-mini".to_owned(), "o4-mini".to_owned()]
        );

        let mini = provider.model_info("mini").expect("allowed alias");
        assert_eq!(mini.model_name, "o4-mini");
        assert_eq!(mini.context_window, 200_000);
        assert!(provider.model_info("o3").is_none());
    }

    #[test]
    fn payload_omits_temperature_when_asked() {
        let messages = vec![ChatMessage::user("hello")];
        let options = GenerateOptions::default();

        let payload = OpenAiCompatibleClient::payload("o3", &messages, &options, false);
        assert!(payload.get("temperature").is_none());
        assert_eq!(payload["messages"][0]["content"], "hello");

        let payload = OpenAiCompatibleClient::payload("gpt-4.1", &messages, &options, true);
        assert_eq!(payload["temperature"], 0.5);
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = OpenAiCompatibleClient::new(
            ProviderType::Custom,
            "http://localhost:11434/v1/",
            None,
            &ProviderOptions::default(),
        )
        .expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }
}
