use std::time::Duration;

use anyhow::{anyhow, Result};
use http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

use crate::config::AppConfig;
use crate::domain::deployment::model::bento_schema::BentoWithRepositorySchema;
use crate::domain::deployment::model::cluster_schema::ClusterSchema;
use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentSchema, DeploymentSchema, UpdateDeploymentSchema,
};

use super::yatai_api_trait::YataiApi;

/// Non-2xx answer from the Yatai API.
#[derive(Debug, Error)]
#[error("Yatai API returned {status}: {message}")]
pub struct UpstreamError {
    pub status: StatusCode,
    pub message: String,
}

/// reqwest-backed [`YataiApi`] scoped to one organization.
pub struct YataiClient {
    client: Client,
    endpoint: String,
    organization: String,
}

impl YataiClient {
    pub fn new(client: Client, endpoint: &str, organization: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self::new(
            client,
            &config.yatai_endpoint,
            &config.yatai_organization,
        ))
    }

    fn org_url(&self, tail: &str) -> String {
        format!(
            "{}/api/v1/orgs/{}/{}",
            self.endpoint,
            encode(&self.organization),
            tail
        )
    }

    fn deployments_url(&self, cluster_name: &str) -> String {
        self.org_url(&format!("clusters/{}/deployments", encode(cluster_name)))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let resp = request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call Yatai (url={}): {}", url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(UpstreamError { status, message }.into());
        }

        resp.json::<T>()
            .await
            .map_err(|e| anyhow!("Failed to decode Yatai response (url={}): {}", url, e))
    }
}

#[async_trait::async_trait]
impl YataiApi for YataiClient {
    async fn fetch_cluster(&self, cluster_name: &str) -> Result<ClusterSchema> {
        let url = self.org_url(&format!("clusters/{}", encode(cluster_name)));
        let cluster: ClusterSchema = self.send(self.client.get(&url), &url).await?;

        debug!("Fetched cluster: {}", cluster.name);
        Ok(cluster)
    }

    async fn fetch_bento(&self, repository: &str, version: &str) -> Result<BentoWithRepositorySchema> {
        let url = self.org_url(&format!(
            "bento_repositories/{}/bentos/{}",
            encode(repository),
            encode(version)
        ));
        let bento: BentoWithRepositorySchema = self.send(self.client.get(&url), &url).await?;

        debug!(
            "Fetched bento {}:{} ({} runner(s))",
            repository,
            version,
            bento.manifest.as_ref().map_or(0, |m| m.runners.len())
        );
        Ok(bento)
    }

    async fn fetch_deployment(&self, cluster_name: &str, deployment_name: &str) -> Result<DeploymentSchema> {
        let url = format!("{}/{}", self.deployments_url(cluster_name), encode(deployment_name));
        let deployment: DeploymentSchema = self.send(self.client.get(&url), &url).await?;

        debug!("Fetched deployment: {}/{}", cluster_name, deployment_name);
        Ok(deployment)
    }

    async fn create_deployment(&self, cluster_name: &str, body: &CreateDeploymentSchema) -> Result<DeploymentSchema> {
        let url = self.deployments_url(cluster_name);
        let deployment: DeploymentSchema = self.send(self.client.post(&url).json(body), &url).await?;

        debug!("Created deployment: {}/{}", cluster_name, deployment.name);
        Ok(deployment)
    }

    async fn update_deployment(
        &self,
        cluster_name: &str,
        deployment_name: &str,
        body: &UpdateDeploymentSchema,
    ) -> Result<DeploymentSchema> {
        let url = format!("{}/{}", self.deployments_url(cluster_name), encode(deployment_name));
        let deployment: DeploymentSchema = self.send(self.client.patch(&url).json(body), &url).await?;

        debug!("Updated deployment: {}/{}", cluster_name, deployment_name);
        Ok(deployment)
    }
}
