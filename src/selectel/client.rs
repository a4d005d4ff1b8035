use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::{Credentials, ProviderConfig};
use crate::dns::finder::Page;
use crate::dns::{RrsetLister, RrsetMutator, ZoneLister};
use crate::error::{ApiError, ConfigError};
use crate::selectel::auth::obtain_token;
use crate::selectel::types::*;

const AUTH_HEADER: &str = "X-Auth-Token";

/// Client for the Selectel Domains v2 API.
///
/// The auth token is fetched lazily before the first request and reused for
/// the lifetime of the client.
pub struct SelectelClient {
    http: Client,
    base_url: String, // e.g. "https://api.selectel.ru/domains/v2"
    auth_url: String,
    credentials: Credentials,
    token: OnceCell<String>,
}

impl SelectelClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
            credentials: config.credentials.clone(),
            token: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn token(&self) -> Result<&str, ApiError> {
        let token = self
            .token
            .get_or_try_init(|| obtain_token(&self.http, &self.auth_url, &self.credentials))
            .await?;
        Ok(token.as_str())
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(req.header(AUTH_HEADER, self.token().await?))
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let res = self.authorized(req).await?.send().await?;
        let status = res.status();
        debug!(url = %res.url(), %status, "domains api response");
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(req).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ZoneLister for SelectelClient {
    async fn list_zones(
        &self,
        filter: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Page<Zone>, ApiError> {
        let req = self.http.get(self.url("zones")).query(&[
            ("filter", filter.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        let list: List<Zone> = self.send_json(req).await?;
        Ok(list.into())
    }
}

#[async_trait]
impl RrsetLister for SelectelClient {
    async fn list_rrsets(
        &self,
        zone_id: &str,
        name: &str,
        rtype: &RecordType,
        limit: usize,
        offset: usize,
    ) -> Result<Page<RRSet>, ApiError> {
        let req = self
            .http
            .get(self.url(&format!("zones/{zone_id}/rrset")))
            .query(&[
                ("name", name.to_string()),
                ("rrset_types", rtype.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]);
        let list: List<RRSet> = self.send_json(req).await?;
        Ok(list.into())
    }
}

#[async_trait]
impl RrsetMutator for SelectelClient {
    async fn create_rrset(&self, zone_id: &str, rrset: &RRSetCreate) -> Result<RRSet, ApiError> {
        let req = self
            .http
            .post(self.url(&format!("zones/{zone_id}/rrset")))
            .json(rrset);
        self.send_json(req).await
    }

    async fn update_rrset(
        &self,
        zone_id: &str,
        rrset_id: &str,
        rrset: &RRSetUpdate,
    ) -> Result<(), ApiError> {
        let req = self
            .http
            .patch(self.url(&format!("zones/{zone_id}/rrset/{rrset_id}")))
            .json(rrset);
        self.send(req).await?;
        Ok(())
    }

    async fn delete_rrset(&self, zone_id: &str, rrset_id: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .delete(self.url(&format!("zones/{zone_id}/rrset/{rrset_id}")));
        self.send(req).await?;
        Ok(())
    }
}
