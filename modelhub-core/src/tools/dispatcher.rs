use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::tools::types::Tool;

/// Routes calls to tools by name. Registering a name twice replaces the
/// earlier tool.
#[derive(Default)]
pub struct ToolDispatcher {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolDispatcher {
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(tool = tool.name(), "registering tool");
        self.tools.insert(tool.name().to_owned(), tool);
    }

    /// `(name, description)` pairs sorted by name.
    pub fn tools(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.description()))
            .collect()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("unknown tool: {name}")))?;
        tracing::debug!(tool = name, "calling tool");
        tool.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::ToolDispatcher;
    use crate::error::Result;
    use crate::tools::types::Tool;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            self.0
        }

        async fn execute(&self, args: Value) -> Result<Value> {
            Ok(json!({ "tool": self.0, "args": args }))
        }
    }

    #[tokio::test]
    async fn routes_calls_by_name() {
        let mut dispatcher = ToolDispatcher::default();
        dispatcher.register(Arc::new(Echo("first")));

        let result = dispatcher
            .call("echo", json!({ "value": 1 }))
            .await
            .expect("call");
        assert_eq!(result, json!({ "tool": "first", "args": { "value": 1 } }));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let dispatcher = ToolDispatcher::default();
        let error = dispatcher
            .call("missing", Value::Null)
            .await
            .expect_err("unknown tool");
        assert_eq!(error.to_string(), "not found: unknown tool: missing");
    }

    #[tokio::test]
    async fn reregistering_replaces_the_tool() {
        let mut dispatcher = ToolDispatcher::default();
        dispatcher.register(Arc::new(Echo("first")));
        dispatcher.register(Arc::new(Echo("second")));

        assert_eq!(dispatcher.tools(), vec![("echo", "second")]);
        let result = dispatcher.call("echo", Value::Null).await.expect("call");
        assert_eq!(result["tool"], "second");
    }
}
