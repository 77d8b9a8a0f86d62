use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::types::ModelProvider;

pub type ProviderHandle = Arc<dyn ModelProvider>;

/// Inputs handed to a constructor binding.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// Empty only for custom providers running without auth.
    pub api_key: String,
    /// Set only for custom providers.
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

type ConstructorFn = dyn Fn(ProviderCredentials) -> Result<ProviderHandle> + Send + Sync;
type FactoryFn = dyn Fn(Option<String>) -> Result<ProviderHandle> + Send + Sync;

/// How the registry builds a provider.
///
/// A `Constructor` bound to [`ProviderType::Custom`](crate::providers::ProviderType::Custom)
/// needs `CUSTOM_API_URL`; a `Factory` is handed the optional key alone and
/// knows its own endpoint.
#[derive(Clone)]
pub enum ProviderBinding {
    Constructor(Arc<ConstructorFn>),
    Factory(Arc<FactoryFn>),
}

impl ProviderBinding {
    pub fn constructor<F>(build: F) -> Self
    where
        F: Fn(ProviderCredentials) -> Result<ProviderHandle> + Send + Sync + 'static,
    {
        Self::Constructor(Arc::new(build))
    }

    pub fn factory<F>(build: F) -> Self
    where
        F: Fn(Option<String>) -> Result<ProviderHandle> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(build))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Constructor(_) => "constructor",
            Self::Factory(_) => "factory",
        }
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderBinding::{}", self.kind())
    }
}
