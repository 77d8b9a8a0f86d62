pub mod binding;
pub mod catalog;
pub mod credentials;
pub mod custom;
pub mod factory;
pub mod google;
pub mod http_client;
pub mod openai;
pub mod openrouter;
pub mod options;
pub mod registry;
pub mod retry;
pub mod types;

pub use binding::{ProviderBinding, ProviderCredentials, ProviderHandle};
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use factory::{create_provider_registry, register_default_providers};
pub use registry::ProviderRegistry;
pub use types::{ChatMessage, GenerateOptions, ModelProvider, ProviderType};
