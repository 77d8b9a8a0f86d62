use std::collections::HashMap;

/// Environment variable carrying the base URL of a constructor-bound custom
/// provider.
pub const CUSTOM_API_URL_ENV: &str = "CUSTOM_API_URL";

/// Read-only view of the variables the registry resolves credentials from.
/// Implementations return `None` for unset and for empty values alike.
pub trait CredentialSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// Fixed set of variables, for embedding without touching the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_owned(), value.to_owned());
        self
    }
}

impl FromIterator<(String, String)> for StaticCredentials {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialSource, StaticCredentials};

    #[test]
    fn empty_values_read_as_unset() {
        let credentials = StaticCredentials::new()
            .with("OPENAI_API_KEY", "sk-test")
            .with("CUSTOM_API_KEY", "");

        assert_eq!(
            credentials.lookup("OPENAI_API_KEY").as_deref(),
            Some("sk-test")
        );
        assert_eq!(credentials.lookup("CUSTOM_API_KEY"), None);
        assert_eq!(credentials.lookup("GEMINI_API_KEY"), None);
    }
}
