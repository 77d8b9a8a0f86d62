pub mod chat;
pub mod dispatcher;
pub mod types;
pub mod version;

use std::sync::Arc;

pub use chat::ChatTool;
pub use dispatcher::ToolDispatcher;
pub use types::Tool;
pub use version::GetVersionTool;

use crate::conversation::ConversationStore;
use crate::providers::registry::ProviderRegistry;

/// Dispatcher with every built-in tool registered.
pub fn create_tool_dispatcher(
    registry: Arc<ProviderRegistry>,
    store: Arc<ConversationStore>,
) -> ToolDispatcher {
    let mut dispatcher = ToolDispatcher::default();
    dispatcher.register(Arc::new(ChatTool::new(Arc::clone(&registry), store)));
    dispatcher.register(Arc::new(GetVersionTool::new(registry)));
    dispatcher
}
