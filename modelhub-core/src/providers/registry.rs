use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::category::ToolModelCategory;
use crate::error::Result;
use crate::providers::binding::{ProviderBinding, ProviderCredentials, ProviderHandle};
use crate::providers::credentials::{CredentialSource, EnvCredentials, CUSTOM_API_URL_ENV};
use crate::providers::types::ProviderType;

/// Returned for extended reasoning when no provider offers anything better.
pub const DEFAULT_REASONING_MODEL: &str = "gemini-2.5-pro-preview-06-05";
/// Returned for fast and balanced work when neither OpenAI nor Gemini is usable.
pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// OpenRouter models known for deep reasoning, checked in this order.
const OPENROUTER_REASONING_CANDIDATES: [&str; 5] = [
    "anthropic/claude-3.5-sonnet",
    "anthropic/claude-3-opus-20240229",
    "meta-llama/llama-3.1-70b-instruct",
    "google/gemini-pro-1.5",
    "mistralai/mixtral-8x7b-instruct",
];

#[derive(Default)]
struct RegistryState {
    /// Registration order is preserved; re-registering keeps the slot.
    bindings: Vec<(ProviderType, ProviderBinding)>,
    initialized: HashMap<ProviderType, ProviderHandle>,
}

impl RegistryState {
    fn binding(&self, provider_type: ProviderType) -> Option<&ProviderBinding> {
        self.bindings
            .iter()
            .find(|(registered, _)| *registered == provider_type)
            .map(|(_, binding)| binding)
    }
}

/// Maps provider types to bindings and caches the instances built from them.
///
/// One registry is normally built at startup and shared (behind an `Arc`)
/// by everything that needs to resolve models. Both maps sit behind a single
/// mutex that stays held while a provider is being constructed, so bindings
/// must not call back into the registry.
pub struct ProviderRegistry {
    state: Mutex<RegistryState>,
    credentials: Arc<dyn CredentialSource>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ProviderRegistry {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        tracing::debug!("creating provider registry");
        Self {
            state: Mutex::new(RegistryState::default()),
            credentials,
        }
    }

    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvCredentials))
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_provider(&self, provider_type: ProviderType, binding: ProviderBinding) {
        let mut state = self.state();
        tracing::debug!(provider = %provider_type, kind = binding.kind(), "registering provider");
        match state
            .bindings
            .iter_mut()
            .find(|(registered, _)| *registered == provider_type)
        {
            Some(slot) => slot.1 = binding,
            None => state.bindings.push((provider_type, binding)),
        }
    }

    pub fn is_registered(&self, provider_type: ProviderType) -> bool {
        self.state().binding(provider_type).is_some()
    }

    /// Returns the cached instance for `provider_type`, building it first if
    /// needed (or always, with `force_new`).
    ///
    /// `Ok(None)` means the type is unregistered or its credentials are
    /// missing. Errors raised by the binding itself are returned as-is and
    /// leave the cache untouched.
    pub fn get_provider(
        &self,
        provider_type: ProviderType,
        force_new: bool,
    ) -> Result<Option<ProviderHandle>> {
        let mut state = self.state();

        if !force_new {
            if let Some(provider) = state.initialized.get(&provider_type) {
                return Ok(Some(Arc::clone(provider)));
            }
        }

        let Some(binding) = state.binding(provider_type).cloned() else {
            return Ok(None);
        };

        let api_key = self.credentials.lookup(provider_type.api_key_env());
        let Some(provider) = self.construct(provider_type, &binding, api_key)? else {
            return Ok(None);
        };

        tracing::debug!(provider = %provider_type, force_new, "initialized provider");
        state
            .initialized
            .insert(provider_type, Arc::clone(&provider));
        Ok(Some(provider))
    }

    fn construct(
        &self,
        provider_type: ProviderType,
        binding: &ProviderBinding,
        api_key: Option<String>,
    ) -> Result<Option<ProviderHandle>> {
        match (provider_type, binding) {
            // Local endpoints may run without auth.
            (ProviderType::Custom, ProviderBinding::Factory(build)) => build(api_key).map(Some),
            (ProviderType::Custom, ProviderBinding::Constructor(build)) => {
                let Some(base_url) = self.credentials.lookup(CUSTOM_API_URL_ENV) else {
                    if api_key.is_some() {
                        tracing::warn!(
                            "CUSTOM_API_KEY set but CUSTOM_API_URL missing, skipping custom provider"
                        );
                    }
                    return Ok(None);
                };
                build(ProviderCredentials {
                    api_key: api_key.unwrap_or_default(),
                    base_url: Some(base_url),
                })
                .map(Some)
            }
            (_, binding) => {
                let Some(api_key) = api_key else {
                    tracing::debug!(
                        provider = %provider_type,
                        env = provider_type.api_key_env(),
                        "no API key configured"
                    );
                    return Ok(None);
                };
                let provider = match binding {
                    ProviderBinding::Constructor(build) => build(ProviderCredentials {
                        api_key,
                        base_url: None,
                    })?,
                    ProviderBinding::Factory(build) => build(Some(api_key))?,
                };
                Ok(Some(provider))
            }
        }
    }

    /// First registered provider, in [`ProviderType::PRIORITY_ORDER`], whose
    /// instance accepts `model_name`. Unregistered types are never built.
    pub fn provider_for_model(&self, model_name: &str) -> Result<Option<ProviderHandle>> {
        tracing::debug!(model = model_name, "resolving provider for model");

        for provider_type in ProviderType::PRIORITY_ORDER {
            if !self.is_registered(provider_type) {
                tracing::debug!(provider = %provider_type, "provider not registered");
                continue;
            }

            match self.get_provider(provider_type, false)? {
                Some(provider) if provider.validate_model_name(model_name) => {
                    tracing::debug!(provider = %provider_type, model = model_name, "provider accepts model");
                    return Ok(Some(provider));
                }
                _ => {
                    tracing::debug!(provider = %provider_type, model = model_name, "provider does not accept model");
                }
            }
        }

        tracing::debug!(model = model_name, "no provider found for model");
        Ok(None)
    }

    /// Registered types in registration order. Nothing is instantiated.
    pub fn available_providers(&self) -> Vec<ProviderType> {
        self.state()
            .bindings
            .iter()
            .map(|(provider_type, _)| *provider_type)
            .collect()
    }

    /// Every model any usable provider lists, mapped to the provider that
    /// [`provider_for_model`](Self::provider_for_model) would pick for it
    /// by priority.
    pub fn available_models(&self) -> Result<BTreeMap<String, ProviderType>> {
        let mut models = BTreeMap::new();

        for provider_type in ProviderType::PRIORITY_ORDER {
            if !self.is_registered(provider_type) {
                continue;
            }
            let Some(provider) = self.get_provider(provider_type, false)? else {
                continue;
            };
            for model in provider.list_models() {
                models.entry(model).or_insert(provider_type);
            }
        }

        Ok(models)
    }

    /// Model name to use when the caller did not pick one.
    pub fn preferred_fallback_model(
        &self,
        category: Option<ToolModelCategory>,
    ) -> Result<String> {
        let openai_available = self.get_provider(ProviderType::OpenAi, false)?.is_some();
        let gemini_available = self.get_provider(ProviderType::Google, false)?.is_some();

        let model = match category {
            Some(ToolModelCategory::ExtendedReasoning) => {
                if openai_available {
                    "o3".to_owned()
                } else if gemini_available {
                    "pro".to_owned()
                } else {
                    self.find_extended_thinking_model()?
                        .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_owned())
                }
            }
            Some(ToolModelCategory::FastResponse) => {
                if openai_available {
                    "o3-mini".to_owned()
                } else if gemini_available {
                    "flash".to_owned()
                } else {
                    DEFAULT_FAST_MODEL.to_owned()
                }
            }
            Some(ToolModelCategory::Balanced) | None => {
                if openai_available {
                    "o3-mini".to_owned()
                } else {
                    DEFAULT_FAST_MODEL.to_owned()
                }
            }
        };

        tracing::debug!(
            category = ?category,
            openai_available,
            gemini_available,
            model = %model,
            "selected fallback model"
        );
        Ok(model)
    }

    fn find_extended_thinking_model(&self) -> Result<Option<String>> {
        if let Some(custom) = self.get_provider(ProviderType::Custom, false)? {
            // Only models the provider will actually serve (allow-list applied).
            let served = custom.model_catalog().and_then(|catalog| {
                catalog
                    .iter()
                    .filter(|spec| spec.supports_extended_thinking)
                    .find(|spec| custom.validate_model_name(&spec.model_name))
            });
            if let Some(spec) = served {
                return Ok(Some(spec.model_name.clone()));
            }
        }

        if let Some(openrouter) = self.get_provider(ProviderType::OpenRouter, false)? {
            for candidate in OPENROUTER_REASONING_CANDIDATES {
                match openrouter.check_model_name(candidate) {
                    Ok(true) => return Ok(Some(candidate.to_owned())),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(
                            model = candidate,
                            error = %err,
                            "model validation on OpenRouter failed, trying next candidate"
                        );
                    }
                }
            }
        }

        Ok(None)
    }

    /// Registered types whose credentials currently resolve.
    pub fn available_providers_with_keys(&self) -> Result<Vec<ProviderType>> {
        let mut available = Vec::new();
        for provider_type in self.available_providers() {
            if self.get_provider(provider_type, false)?.is_some() {
                available.push(provider_type);
            }
        }
        Ok(available)
    }

    /// Drops every cached instance. Bindings stay registered.
    pub fn clear_cache(&self) {
        self.state().initialized.clear();
    }

    pub fn unregister_provider(&self, provider_type: ProviderType) {
        let mut state = self.state();
        state
            .bindings
            .retain(|(registered, _)| *registered != provider_type);
        state.initialized.remove(&provider_type);
    }
}
