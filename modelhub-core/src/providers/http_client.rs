use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, Result};
use crate::providers::types::ProviderType;

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

pub fn normalize_timeout_ms(timeout_ms: u64) -> u64 {
    if timeout_ms == 0 {
        DEFAULT_TIMEOUT_MS
    } else {
        timeout_ms
    }
}

/// JSON content type, a bearer token when `api_key` is non-empty, then the
/// configured extra headers (which may override either).
pub fn default_headers(
    provider_type: ProviderType,
    api_key: Option<&str>,
    extra_headers: &[(String, String)],
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(api_key) = api_key.filter(|key| !key.is_empty()) {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|err| {
            Error::Config(format!("invalid {provider_type} API key header: {err}"))
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
    }

    for (name, value) in extra_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            Error::Config(format!(
                "invalid {provider_type} custom header name '{name}': {err}"
            ))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            Error::Config(format!(
                "invalid {provider_type} custom header value for '{name}': {err}"
            ))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

pub fn build_client(
    provider_type: ProviderType,
    headers: HeaderMap,
    timeout_ms: u64,
) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(std::time::Duration::from_millis(normalize_timeout_ms(
            timeout_ms,
        )))
        .build()
        .map_err(|err| Error::Provider(format!("failed to build {provider_type} client: {err}")))
}
