//! Per-challenge solver configuration and the validated provider config
//! derived from it.
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.selectel.ru/domains/v2";
pub const DEFAULT_AUTH_URL: &str = "https://cloud.api.selcloud.ru/identity/v3";
pub const MIN_TTL: u32 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Reference to the secret holding the API credentials.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SecretRef {
    #[serde(default)]
    pub name: String,
    /// When set, this entry of the secret holds an API token.
    #[serde(default)]
    pub key: Option<String>,
}

/// The `config` block of an issuer's webhook solver, as sent with every
/// challenge request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default, alias = "dnsSecretRef")]
    pub secret_ref: SecretRef,
    #[serde(default)]
    pub ttl: Option<u32>,
    /// Seconds.
    #[serde(default)]
    pub http_timeout: Option<u64>,
    #[serde(default, rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(default, rename = "authURL")]
    pub auth_url: Option<String>,
}

/// Decode the raw solver config. Fails before any network call.
pub fn load_config(raw: Option<&serde_json::Value>) -> Result<SolverConfig, ConfigError> {
    let raw = match raw {
        Some(serde_json::Value::Null) | None => return Err(ConfigError::Absent),
        Some(raw) => raw,
    };
    let config = SolverConfig::deserialize(raw)?;
    if config.secret_ref.name.trim().is_empty() {
        return Err(ConfigError::SecretNameNotSetup);
    }
    Ok(config)
}

#[derive(Clone, PartialEq)]
pub enum Credentials {
    /// Static API token sent as is.
    Token(String),
    /// Service user exchanged for a project-scoped token.
    Password {
        username: String,
        password: String,
        account_id: String,
        project_id: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Credentials::Password {
                username,
                account_id,
                project_id,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("account_id", account_id)
                .field("project_id", project_id)
                .finish(),
        }
    }
}

/// Validated configuration for one present/cleanup call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub auth_url: String,
    pub ttl: u32,
    pub http_timeout: Duration,
    pub credentials: Credentials,
}

impl ProviderConfig {
    pub fn new(config: &SolverConfig, credentials: Credentials) -> Result<Self, ConfigError> {
        let ttl = config.ttl.unwrap_or(MIN_TTL);
        if ttl < MIN_TTL {
            return Err(ConfigError::InvalidTtl { ttl, min: MIN_TTL });
        }
        let http_timeout = config.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout == 0 {
            return Err(ConfigError::InvalidHttpTimeout);
        }

        Ok(Self {
            base_url: non_empty_or(&config.base_url, DEFAULT_BASE_URL),
            auth_url: non_empty_or(&config.auth_url, DEFAULT_AUTH_URL),
            ttl,
            http_timeout: Duration::from_secs(http_timeout),
            credentials,
        })
    }
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.trim_end_matches('/').to_string(),
        _ => default.to_string(),
    }
}
