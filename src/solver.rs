//! The solver contract the webhook server drives, and its Selectel
//! implementation.
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, watch};
use tracing::{info, warn};

use crate::config::{Credentials, ProviderConfig, load_config};
use crate::error::SolverError;
use crate::provider::DnsProvider;
use crate::secrets::{KubeClientConfig, KubeSecretStore, SecretStore};
use crate::selectel::SelectelClient;
use crate::validation::CredentialsValidator;

pub const SELECTEL_SOLVER_NAME: &str = "selectel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    Present,
    CleanUp,
}

/// A single DNS-01 challenge as handed over by cert-manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub uid: String,
    pub action: ChallengeAction,
    #[serde(default, rename = "type")]
    pub challenge_type: String,
    #[serde(default)]
    pub dns_name: String,
    pub key: String,
    #[serde(default)]
    pub resource_namespace: String,
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    pub resolved_zone: String,
    #[serde(default)]
    pub allow_ambient_credentials: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// A DNS provider plugin. Several may be registered in one webhook; they are
/// told apart by [`Solver::name`].
#[async_trait]
pub trait Solver: Send + Sync {
    fn name(&self) -> &str;

    /// Publish the challenge record. Must tolerate repeated calls.
    async fn present(&self, req: &ChallengeRequest) -> Result<(), SolverError>;

    /// Remove only the record matching `req.key`.
    async fn cleanup(&self, req: &ChallengeRequest) -> Result<(), SolverError>;

    /// Called once before any present/cleanup. Flipping `stop` to `true`
    /// cancels calls in flight.
    async fn initialize(
        &self,
        kube: &KubeClientConfig,
        stop: watch::Receiver<bool>,
    ) -> Result<(), SolverError>;
}

pub struct SelectelSolver {
    validator: Arc<CredentialsValidator>,
    secrets: OnceCell<Arc<dyn SecretStore>>,
    stop: OnceCell<watch::Receiver<bool>>,
}

impl SelectelSolver {
    pub fn new(validator: Arc<CredentialsValidator>) -> Self {
        Self {
            validator,
            secrets: OnceCell::new(),
            stop: OnceCell::new(),
        }
    }

    /// Initialize with an explicit secret store.
    pub fn init_with(
        &self,
        secrets: Arc<dyn SecretStore>,
        stop: watch::Receiver<bool>,
    ) -> Result<(), SolverError> {
        self.secrets
            .set(secrets)
            .map_err(|_| SolverError::AlreadyInitialized)?;
        self.stop
            .set(stop)
            .map_err(|_| SolverError::AlreadyInitialized)?;
        Ok(())
    }

    async fn provider(
        &self,
        req: &ChallengeRequest,
    ) -> Result<DnsProvider<SelectelClient>, SolverError> {
        let config = load_config(req.config.as_ref())?;
        let secrets = self.secrets.get().ok_or(SolverError::NotInitialized)?;
        let data = secrets
            .get_secret(&req.resource_namespace, &config.secret_ref.name)
            .await?;

        let credentials = match &config.secret_ref.key {
            Some(key) => Credentials::Token(self.validator.token(&data, key)?),
            None => self.validator.validate(&data)?,
        };
        let provider_config = ProviderConfig::new(&config, credentials)?;
        let client = SelectelClient::new(&provider_config)?;

        Ok(DnsProvider::new(client, provider_config.ttl))
    }

    /// Run `fut` unless the stop signal fires first.
    async fn until_stopped<F>(&self, fut: F) -> Result<(), SolverError>
    where
        F: Future<Output = Result<(), SolverError>> + Send,
    {
        let mut stop = self.stop.get().cloned().ok_or(SolverError::NotInitialized)?;
        let stopped = *stop.borrow();
        if stopped {
            return Err(SolverError::Cancelled);
        }

        tokio::select! {
            res = fut => res,
            _ = wait_for_stop(&mut stop) => {
                warn!("stop signal received, abandoning challenge operation");
                Err(SolverError::Cancelled)
            }
        }
    }
}

async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    let stopped = stop.wait_for(|s| *s).await.is_ok();
    if !stopped {
        // sender gone: nobody can stop us any more
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl Solver for SelectelSolver {
    fn name(&self) -> &str {
        SELECTEL_SOLVER_NAME
    }

    async fn present(&self, req: &ChallengeRequest) -> Result<(), SolverError> {
        info!(uid = %req.uid, fqdn = %req.resolved_fqdn, zone = %req.resolved_zone, "present");
        self.until_stopped(async {
            let provider = self.provider(req).await?;
            provider
                .present(&req.resolved_zone, &req.resolved_fqdn, &req.key)
                .await
                .map_err(SolverError::Present)
        })
        .await
    }

    async fn cleanup(&self, req: &ChallengeRequest) -> Result<(), SolverError> {
        info!(uid = %req.uid, fqdn = %req.resolved_fqdn, zone = %req.resolved_zone, "cleanup");
        self.until_stopped(async {
            let provider = self.provider(req).await?;
            provider
                .cleanup(&req.resolved_zone, &req.resolved_fqdn, &req.key)
                .await
                .map_err(SolverError::CleanUp)
        })
        .await
    }

    async fn initialize(
        &self,
        kube: &KubeClientConfig,
        stop: watch::Receiver<bool>,
    ) -> Result<(), SolverError> {
        let store = KubeSecretStore::new(kube)?;
        self.init_with(Arc::new(store), stop)
    }
}
