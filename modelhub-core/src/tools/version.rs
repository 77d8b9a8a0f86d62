use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::providers::registry::ProviderRegistry;
use crate::tools::types::Tool;

/// Reports the crate version, the host platform, and which providers have
/// usable credentials. `server_id` is fixed for the lifetime of the tool.
pub struct GetVersionTool {
    registry: Arc<ProviderRegistry>,
    server_id: Uuid,
}

impl GetVersionTool {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            server_id: Uuid::new_v4(),
        }
    }
}

#[async_trait]
impl Tool for GetVersionTool {
    fn name(&self) -> &str {
        "get_version"
    }

    fn description(&self) -> &str {
        "VERSION & CONFIGURATION - Get version, platform, and configured providers"
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        let providers: Vec<&str> = self
            .registry
            .available_providers_with_keys()?
            .iter()
            .map(|provider_type| provider_type.as_str())
            .collect();

        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "platform": format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            "server_id": self.server_id.to_string(),
            "providers": providers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::GetVersionTool;
    use crate::config::schema::Config;
    use crate::providers::credentials::StaticCredentials;
    use crate::providers::factory::register_default_providers;
    use crate::providers::registry::ProviderRegistry;
    use crate::tools::types::Tool;

    #[tokio::test]
    async fn reports_version_and_keyed_providers() {
        let registry = ProviderRegistry::new(Arc::new(
            StaticCredentials::new().with("OPENAI_API_KEY", "openai-key"),
        ));
        register_default_providers(&registry, &Config::default());
        let tool = GetVersionTool::new(Arc::new(registry));

        let first = tool.execute(Value::Null).await.expect("version");
        assert_eq!(first["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(first["providers"], serde_json::json!(["openai"]));

        let server_id = first["server_id"].as_str().expect("server id");
        assert!(uuid::Uuid::parse_str(server_id).is_ok());
        let second = tool.execute(Value::Null).await.expect("version");
        assert_eq!(second["server_id"], first["server_id"]);
    }
}
