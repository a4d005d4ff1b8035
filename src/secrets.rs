//! Reading credential secrets from the Kubernetes API.
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, SecretError};

pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Raw secret data keyed by entry name.
pub type SecretData = BTreeMap<String, Vec<u8>>;

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretError>;
}

/// Where and how to reach the Kubernetes API.
#[derive(Clone)]
pub struct KubeClientConfig {
    pub api_server: String,
    pub token: String,
    /// PEM bundle used to verify the API server.
    pub ca_cert: Option<Vec<u8>>,
}

impl KubeClientConfig {
    /// Configuration of the pod's own service account.
    pub fn in_cluster() -> Result<Self, SecretError> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            SecretError::ClientConfig(
                "KUBERNETES_SERVICE_HOST not set, not running in Kubernetes?".into(),
            )
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
        let dir = Path::new(SERVICE_ACCOUNT_DIR);
        // pods without a mounted CA fall back to the system roots
        let ca = dir.join("ca.crt");
        let ca = ca.exists().then_some(ca.as_path());

        Self::from_files(format!("https://{host}:{port}"), &dir.join("token"), ca)
    }

    /// Explicit token and CA files. A CA file that was named but cannot be
    /// read is an error.

    pub fn from_files(
        api_server: impl Into<String>,
        token_file: &Path,
        ca_file: Option<&Path>,
    ) -> Result<Self, SecretError> {
        let token = std::fs::read_to_string(token_file).map_err(|e| {
            SecretError::ClientConfig(format!(
                "read service account token {}: {e}",
                token_file.display()
            ))
        })?;
        let ca_cert = ca_file
            .map(|p| {
                std::fs::read(p).map_err(|e| {
                    SecretError::ClientConfig(format!("read CA file {}: {e}", p.display()))
                })
            })
            .transpose()?;

        Ok(Self {
            api_server: api_server.into(),
            token: token.trim().to_string(),
            ca_cert,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SecretObject {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

/// Fetches `v1/Secret` objects with a bearer token.
pub struct KubeSecretStore {
    http: Client,
    api_server: String,
    token: String,
}

impl KubeSecretStore {
    pub fn new(config: &KubeClientConfig) -> Result<Self, SecretError> {
        let builder = Client::builder().timeout(Duration::from_secs(10));
        let http = with_ca(builder, config.ca_cert.as_deref())?
            .build()
            .map_err(|e| SecretError::ClientConfig(format!("build http client: {e}")))?;

        Ok(Self {
            http,
            api_server: config.api_server.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }
}

#[cfg(feature = "https-client")]
fn with_ca(builder: ClientBuilder, ca: Option<&[u8]>) -> Result<ClientBuilder, SecretError> {
    let Some(pem) = ca else {
        return Ok(builder);
    };
    let cert = reqwest::Certificate::from_pem(pem)
        .map_err(|e| SecretError::ClientConfig(format!("parse CA certificate: {e}")))?;
    Ok(builder.add_root_certificate(cert))
}

#[cfg(not(feature = "https-client"))]
fn with_ca(builder: ClientBuilder, _ca: Option<&[u8]>) -> Result<ClientBuilder, SecretError> {
    Ok(builder)
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretError> {
        let url = format!(
            "{}/api/v1/namespaces/{}/secrets/{}",
            self.api_server, namespace, name
        );
        debug!(%url, "fetching secret");

        let res = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = res.bytes().await.map_err(ApiError::from)?;
        let secret: SecretObject = serde_json::from_slice(&bytes).map_err(ApiError::from)?;

        secret
            .data
            .into_iter()
            .map(|(key, value)| match BASE64.decode(value.as_bytes()) {
                Ok(decoded) => Ok((key, decoded)),
                Err(source) => Err(SecretError::Decode { key, source }),
            })
            .collect()
    }
}
