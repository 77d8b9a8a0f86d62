use serde::{Deserialize, Serialize};

/// One model a provider can serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default)]
    pub supports_extended_thinking: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_context_window() -> usize {
    32_768
}

impl ModelSpec {
    pub fn new(model_name: &str, context_window: usize) -> Self {
        Self {
            model_name: model_name.to_owned(),
            aliases: Vec::new(),
            context_window,
            supports_extended_thinking: false,
            description: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| (*alias).to_owned()).collect();
        self
    }

    pub fn with_extended_thinking(mut self) -> Self {
        self.supports_extended_thinking = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    fn matches(&self, name: &str) -> bool {
        self.model_name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Ordered model table. Lookups are case-insensitive over names and aliases;
/// iteration keeps declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<ModelSpec>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }

    pub fn find(&self, name: &str) -> Option<&ModelSpec> {
        let name = name.trim();
        self.models.iter().find(|spec| spec.matches(name))
    }

    /// Canonical name for `name`, if it is a known model or alias.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.find(name).map(|spec| spec.model_name.as_str())
    }
}

/// Optional allow-list. An empty list allows everything; entries may name a
/// canonical model or one of its aliases.
#[derive(Debug, Clone, Default)]
pub struct ModelRestriction {
    allowed: Vec<String>,
}

impl ModelRestriction {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed
                .iter()
                .map(|model| model.trim().to_ascii_lowercase())
                .filter(|model| !model.is_empty())
                .collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn allows(&self, canonical: &str, requested: &str) -> bool {
        self.is_unrestricted()
            || self.allowed.iter().any(|allowed| {
                allowed.eq_ignore_ascii_case(canonical) || allowed.eq_ignore_ascii_case(requested)
            })
    }

    pub fn allows_spec(&self, spec: &ModelSpec) -> bool {
        self.allows(&spec.model_name, &spec.model_name)
            || spec
                .aliases
                .iter()
                .any(|alias| self.allows(&spec.model_name, alias))
    }
}

#[cfg(test)]
mod tests {
    use super::{ModelCatalog, ModelRestriction, ModelSpec};

    fn catalog() -> ModelCatalog {
        ModelCatalog::new(vec![
            ModelSpec::new("llama3.2", 128_000).with_aliases(&["local-llama"]),
            ModelSpec::new("qwq-32b", 32_000).with_extended_thinking(),
            ModelSpec::new("deepseek-r1", 64_000).with_extended_thinking(),
        ])
    }

    #[test]
    fn finds_models_by_alias_ignoring_case() {
        let catalog = catalog();
        assert_eq!(catalog.canonical_name("LOCAL-LLAMA"), Some("llama3.2"));
        assert_eq!(catalog.canonical_name(" qwq-32b "), Some("qwq-32b"));
        assert_eq!(catalog.canonical_name("gpt-4.1"), None);
    }

    #[test]
    fn restriction_accepts_alias_entries() {
        let restriction = ModelRestriction::new(&["Local-Llama".to_owned()]);
        let catalog = catalog();
        let llama = catalog.find("llama3.2").expect("llama");
        let qwq = catalog.find("qwq-32b").expect("qwq");

        assert!(restriction.allows_spec(llama));
        assert!(!restriction.allows_spec(qwq));
        assert!(ModelRestriction::default().allows_spec(qwq));
    }
}
