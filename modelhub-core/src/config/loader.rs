use std::path::Path;

use crate::config::schema::Config;
use crate::error::{Error, Result};

pub fn load_from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    toml::from_str(&content).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}

/// Loads and validates `path`, or returns the defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };
    crate::config::validate_config(&config)?;
    tracing::debug!(
        source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "<defaults>".to_owned()),
        custom_models = config.providers.custom.models.len(),
        "loaded modelhub configuration"
    );
    Ok(config)
}
