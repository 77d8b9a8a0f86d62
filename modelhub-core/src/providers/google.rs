use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::providers::catalog::{ModelCatalog, ModelRestriction, ModelSpec};
use crate::providers::http_client::{build_client, default_headers};
use crate::providers::options::ProviderOptions;
use crate::providers::retry::{send_with_retry, RetryPolicy};
use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(crate) fn gemini_models() -> ModelCatalog {
    ModelCatalog::new(vec![
        ModelSpec::new("gemini-2.5-flash-preview-05-20", 1_048_576)
            .with_aliases(&["flash"])
            .with_description("Ultra-fast model for quick analysis"),
        ModelSpec::new("gemini-2.5-pro-preview-06-05", 1_048_576)
            .with_aliases(&["pro"])
            .with_extended_thinking()
            .with_description("Deep reasoning with thinking mode"),
        ModelSpec::new("gemini-2.0-flash", 1_048_576)
            .with_aliases(&["flash-2.0"])
            .with_description("Previous-generation fast model"),
        ModelSpec::new("gemini-2.0-flash-lite", 1_048_576)
            .with_aliases(&["flashlite"])
            .with_description("Lightweight fast model, text only"),
    ])
}

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    catalog: ModelCatalog,
    restriction: ModelRestriction,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: &str, options: &ProviderOptions) -> Result<Self> {
        // Gemini authenticates with a `key` query parameter, not a bearer token.
        let headers = default_headers(ProviderType::Google, None, &options.extra_headers)?;
        let client = build_client(ProviderType::Google, headers, options.timeout_ms)?;

        Ok(Self {
            api_key: api_key.to_owned(),
            base_url: options.base_url_or(DEFAULT_GEMINI_BASE_URL),
            catalog: gemini_models(),
            restriction: ModelRestriction::new(&options.allowed_models),
            client,
            retry_policy: options.retry_policy.clone(),
        })
    }

    fn generate_endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn build_payload(messages: &[ChatMessage], options: &GenerateOptions) -> Value {
        let (system_instruction, contents) = convert_messages(messages);

        let mut payload = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_tokens,
            },
        });

        if let Some(system_text) = system_instruction {
            payload["system_instruction"] = json!({ "parts": [{ "text": system_text }] });
        }

        payload
    }
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiOutputContent,
}

#[derive(Debug, Deserialize)]
struct GeminiOutputContent {
    #[serde(default)]
    parts: Vec<GeminiOutputPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiOutputPart {
    text: Option<String>,
}

/// System messages become the system instruction; assistant turns map to
/// the `model` role and everything else to `user`.
fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<GeminiContent>) {
    let (system, conversation): (Vec<&ChatMessage>, Vec<&ChatMessage>) = messages
        .iter()
        .partition(|message| message.role == "system");

    let system = (!system.is_empty()).then(|| {
        system
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    });

    let contents = conversation
        .into_iter()
        .map(|message| GeminiContent {
            role: if message.role == "assistant" {
                "model"
            } else {
                "user"
            },
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        })
        .collect();

    (system, contents)
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Google
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
                "model '{model_name}' is not available from google"
            )));
        }
        let model = self.resolve_model_name(model_name);

        let request = self
            .client
            .post(self.generate_endpoint(&model))
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_payload(messages, options));

        let response = send_with_retry(request, &self.retry_policy, "google request").await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(Error::Provider(format!(
                "google request failed with status {status}: {body}"
            )));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|err| Error::Provider(format!("failed to parse google response: {err}")))?;

        let text = payload
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .filter_map(|part| part.text)
            .collect::<String>();

        if text.is_empty() {
            return Err(Error::Provider("google returned no text".to_owned()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{convert_messages, GeminiProvider};
    use crate::providers::options::ProviderOptions;
    use crate::providers::types::{ChatMessage, GenerateOptions, ModelProvider};

    fn provider() -> GeminiProvider {
        GeminiProvider::new("gemini-key", &ProviderOptions::default()).expect("provider")
    }

    #[test]
    fn accepts_fallback_shorthands() {
        let provider = provider();
        assert!(provider.validate_model_name("flash"));
        assert!(provider.validate_model_name("pro"));
        assert!(provider.validate_model_name("gemini-2.5-flash-preview-05-20"));
        assert_eq!(
            provider.resolve_model_name("pro"),
            "gemini-2.5-pro-preview-06-05"
        );
        assert!(!provider.validate_model_name("o3"));
    }

    #[test]
    fn model_info_resolves_aliases() {
        let provider = provider();
        let pro = provider.model_info("PRO").expect("pro is known");
        assert_eq!(pro.model_name, "gemini-2.5-pro-preview-06-05");
        assert_eq!(pro.context_window, 1_048_576);
        assert!(pro.supports_extended_thinking);
        assert!(pro.description.is_some());
        assert!(provider.model_info("o3").is_none());
    }

    #[test]
    fn endpoint_embeds_canonical_model() {
        let provider = provider();
        assert_eq!(
            provider.generate_endpoint("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn system_messages_become_instruction() {
        let messages = vec![
            ChatMessage {
                role: "system".to_owned(),
                content: "be terse".to_owned(),
            },
            ChatMessage::user("hi"),
            ChatMessage {
                role: "assistant".to_owned(),
                content: "hello".to_owned(),
            },
        ];

        let (system, contents) = convert_messages(&messages);
        assert_eq!(system.as_deref(), Some("be terse"));
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].role, "model");

        let payload = GeminiProvider::build_payload(&messages, &GenerateOptions::default());
        assert_eq!(payload["system_instruction"]["parts"][0]["text"], "be terse");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 4096);
    }
}
