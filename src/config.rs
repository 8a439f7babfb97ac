//! Provider configuration.
//!
//! Each setting comes from the host's provider block first, then from its
//! environment variable, then from a built-in default. The result is built
//! once in `configure` and never consulted from inside controllers.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::client::HttpClient;
use crate::error::ProviderError;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BASISTHEORY_API_KEY";
/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "BASISTHEORY_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const CLIENT_TIMEOUT_ENV: &str = "BASISTHEORY_CLIENT_TIMEOUT";

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.basistheory.com";
/// Request timeout when none is configured, in seconds.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 15;

/// Identity of the plugin host, reported in the `User-Agent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Host product name, e.g. `Terraform`.
    pub name: String,
    /// Host version.
    pub version: String,
}

impl HostInfo {
    /// Describe a host.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for HostInfo {
    fn default() -> Self {
        Self::new("Terraform", "unknown")
    }
}

/// Resolved provider settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Tenant API key sent with every request.
    pub api_key: String,
    /// API base URL.
    pub api_url: Url,
    /// Per-request timeout.
    pub client_timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"(sensitive)")
            .field("api_url", &self.api_url.as_str())
            .field("client_timeout", &self.client_timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve settings from the provider block and the process environment.
    pub fn from_value(config: &Value) -> Result<Self, ProviderError> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings from the provider block, reading fallbacks through `env`.
    pub fn resolve<F>(config: &Value, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = setting(config, "api_key", API_KEY_ENV, &env).unwrap_or_default();

        let raw_url =
            setting(config, "api_url", API_URL_ENV, &env).unwrap_or_else(|| DEFAULT_API_URL.into());
        let api_url = Url::parse(&raw_url).map_err(|e| {
            ProviderError::Configuration(format!("api_url {:?} is not a valid URL: {}", raw_url, e))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ProviderError::Configuration(format!(
                "api_url {:?} must be an absolute http(s) URL",
                raw_url
            )));
        }

        let seconds = match setting(config, "client_timeout", CLIENT_TIMEOUT_ENV, &env) {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "client_timeout must be a positive number of seconds, got {:?}",
                    raw
                ))
            })?,
            None => DEFAULT_CLIENT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            api_url,
            client_timeout: Duration::from_secs(seconds),
        })
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(host: &HostInfo) -> String {
        format!(
            "HashiCorp {}/{} Basis Theory Terraform Plugin SDK/{}",
            host.name,
            host.version,
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Build the HTTP client these settings describe.
    pub fn build_client(&self, host: &HostInfo) -> Result<HttpClient, ProviderError> {
        HttpClient::new(
            self.api_url.clone(),
            &self.api_key,
            &Self::user_agent(host),
            self.client_timeout,
        )
        .map_err(|e| ProviderError::Configuration(e.to_string()))
    }
}

/// Provider block value, then environment. Empty values count as unset.
fn setting<F>(config: &Value, key: &str, env_name: &str, env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let configured = match config.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    configured
        .filter(|s| !s.is_empty())
        .or_else(|| env(env_name).filter(|s| !s.is_empty()))
}
