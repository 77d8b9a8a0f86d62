use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::category::ToolModelCategory;
use crate::conversation::{ConversationStore, Turn};
use crate::error::{Error, Result};
use crate::providers::registry::ProviderRegistry;
use crate::providers::types::{ChatMessage, GenerateOptions};
use crate::tools::types::Tool;

const CHAT_TOOL: &str = "chat";

#[derive(Debug, Deserialize)]
struct ChatArgs {
    #[serde(default)]
    prompt: String,
    model: Option<String>,
    continuation_id: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    #[serde(default)]
    files: Vec<String>,
}

/// Sends a prompt to whichever provider serves the model, replaying the
/// thread named by `continuation_id` as history.
///
/// A missing, unknown, or expired `continuation_id` starts a fresh thread.
/// Without `model` the balanced fallback model is used.
pub struct ChatTool {
    registry: Arc<ProviderRegistry>,
    store: Arc<ConversationStore>,
}

impl ChatTool {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<ConversationStore>) -> Self {
        Self { registry, store }
    }
}

#[async_trait]
impl Tool for ChatTool {
    fn name(&self) -> &str {
        CHAT_TOOL
    }

    fn description(&self) -> &str {
        "GENERAL CHAT - Send a prompt to the language model"
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: ChatArgs = serde_json::from_value(args)
            .map_err(|err| Error::Validation(format!("invalid chat arguments: {err}")))?;
        if args.prompt.trim().is_empty() {
            return Err(Error::Validation("prompt required".to_owned()));
        }

        let existing = match args.continuation_id.as_deref() {
            Some(id) => {
                let thread = self.store.get(id)?;
                if thread.is_none() {
                    tracing::debug!(thread = id, "continuation not found, starting a new thread");
                }
                thread
            }
            None => None,
        };
        let thread = match existing {
            Some(thread) => thread,
            None => self.store.create_thread()?,
        };

        let model = match args.model {
            Some(model) => model,
            None => self
                .registry
                .preferred_fallback_model(Some(ToolModelCategory::Balanced))?,
        };
        let provider = self
            .registry
            .provider_for_model(&model)?
            .ok_or_else(|| Error::Tool(format!("no configured provider serves model '{model}'")))?;

        let mut messages: Vec<ChatMessage> = thread
            .turns
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect();
        messages.push(ChatMessage::user(args.prompt.clone()));

        let defaults = GenerateOptions::default();
        let options = GenerateOptions {
            temperature: args.temperature.unwrap_or(defaults.temperature),
            max_tokens: args.max_tokens.unwrap_or(defaults.max_tokens),
        };
        tracing::info!(
            model = %model,
            provider = %provider.provider_type(),
            thread = %thread.id,
            history = thread.turns.len(),
            "sending chat prompt"
        );
        let response = provider.generate(&model, &messages, &options).await?;

        self.store.add_turn(
            &thread.id,
            Turn::new("user", args.prompt)
                .with_files(args.files)
                .with_tool(CHAT_TOOL),
        )?;
        self.store.add_turn(
            &thread.id,
            Turn::new("assistant", response.clone()).with_tool(CHAT_TOOL),
        )?;

        Ok(json!({
            "continuation_id": thread.id,
            "response": response,
            "model": model,
            "provider": provider.provider_type().as_str(),
        }))
    }
}
