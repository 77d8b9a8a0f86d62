//! Resolves logical model names to the remote provider that serves them.
//!
//! The [`ProviderRegistry`] holds one binding per [`ProviderType`], builds
//! provider clients lazily from environment credentials, caches them, and
//! picks a default model for a [`ToolModelCategory`] when the caller has
//! none.
//!
//! On top of the registry sit a small [`tools`] layer (a name-keyed
//! dispatcher with `chat` and `get_version`) and the [`conversation`]
//! thread store that lets `chat` continue earlier exchanges.

pub mod category;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod providers;
pub mod tools;

pub use category::ToolModelCategory;
pub use config::Config;
pub use conversation::ConversationStore;
pub use error::{Error, Result};
pub use providers::{ModelProvider, ProviderRegistry, ProviderType};
pub use tools::{Tool, ToolDispatcher};
