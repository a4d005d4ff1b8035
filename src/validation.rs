use std::collections::BTreeMap;
use std::fmt;

use crate::config::Credentials;

/// Secret entry holding a static API token.
pub const TOKEN_FIELD: &str = "token";

/// One problem with a single secret field, keyed by the secret entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required(String),
    NotUtf8(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required(field) => write!(f, "field {field} is required"),
            FieldError::NotUtf8(field) => write!(f, "field {field} must be valid UTF-8"),
        }
    }
}

/// All field problems found in one secret, reported together.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Checks credential material read from a secret.
///
/// Built once at startup and shared by every solver call.
#[derive(Debug, Clone)]
pub struct CredentialsValidator {
    required: Vec<&'static str>,
}

impl Default for CredentialsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialsValidator {
    pub fn new() -> Self {
        Self {
            required: vec!["username", "password", "account_id", "project_id"],
        }
    }

    /// Turn secret data into credentials. A non-empty `token` entry selects
    /// token auth; otherwise every password field must be present.
    pub fn validate(&self, data: &BTreeMap<String, Vec<u8>>) -> Result<Credentials, ValidationError> {
        if data.contains_key(TOKEN_FIELD) {
            let token = self.token(data, TOKEN_FIELD)?;
            return Ok(Credentials::Token(token));
        }

        let mut errors = Vec::new();
        let mut values = Vec::with_capacity(self.required.len());
        for field in &self.required {
            match field_value(data, field) {
                Ok(v) => values.push(v),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(ValidationError { fields: errors });
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Credentials::Password {
            username: next(),
            password: next(),
            account_id: next(),
            project_id: next(),
        })
    }

    /// Read a single token entry, as named by `secretRef.key`.
    pub fn token(&self, data: &BTreeMap<String, Vec<u8>>, key: &str) -> Result<String, ValidationError> {
        field_value(data, key).map_err(|e| ValidationError { fields: vec![e] })
    }
}

fn field_value(data: &BTreeMap<String, Vec<u8>>, field: &str) -> Result<String, FieldError> {
    let raw = data
        .get(field)
        .ok_or_else(|| FieldError::Required(field.to_string()))?;
    let value = std::str::from_utf8(raw).map_err(|_| FieldError::NotUtf8(field.to_string()))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::Required(field.to_string()));
    }
    Ok(value.to_string())
}
