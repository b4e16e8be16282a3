use async_trait::async_trait;

use crate::domain::deployment::model::bento_schema::BentoWithRepositorySchema;
use crate::domain::deployment::model::cluster_schema::ClusterSchema;
use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentSchema, DeploymentSchema, UpdateDeploymentSchema,
};

/// The parts of the Yatai REST API the deployment form depends on.
#[async_trait]
pub trait YataiApi: Send + Sync {
    async fn fetch_cluster(&self, cluster_name: &str) -> anyhow::Result<ClusterSchema>;

    async fn fetch_bento(
        &self,
        repository: &str,
        version: &str,
    ) -> anyhow::Result<BentoWithRepositorySchema>;

    /// Deployment including its latest revision.
    async fn fetch_deployment(
        &self,
        cluster_name: &str,
        deployment_name: &str,
    ) -> anyhow::Result<DeploymentSchema>;

    async fn create_deployment(
        &self,
        cluster_name: &str,
        body: &CreateDeploymentSchema,
    ) -> anyhow::Result<DeploymentSchema>;

    async fn update_deployment(
        &self,
        cluster_name: &str,
        deployment_name: &str,
        body: &UpdateDeploymentSchema,
    ) -> anyhow::Result<DeploymentSchema>;
}
