use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnNull};

use super::bento_schema::BentoWithRepositorySchema;
use super::cluster_schema::ClusterSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTargetType {
    #[default]
    Stable,
    Canary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanaryRuleType {
    Weight,
    Header,
    Cookie,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanaryRule {
    #[serde(rename = "type")]
    pub rule_type: CanaryRuleType,
    pub weight: Option<u32>,
    pub header: Option<String>,
    pub cookie: Option<String>,
    pub header_value: Option<String>,
}

/// Horizontal autoscaling bounds. Values are passed through unchecked.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HpaConf {
    pub min_replicas: Option<i32>,
    pub max_replicas: Option<i32>,
}

/// Quantities are opaque strings ("500m", "1024Mi"); nothing here parses them.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceItem {
    #[serde_as(as = "DefaultOnNull")]
    pub cpu: String,
    #[serde_as(as = "DefaultOnNull")]
    pub memory: String,
    #[serde_as(as = "DefaultOnNull")]
    pub gpu: String,
    #[serde_as(as = "DefaultOnNull")]
    pub custom: BTreeMap<String, String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub requests: Option<ResourceItem>,
    pub limits: Option<ResourceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvItem {
    pub key: String,
    pub value: String,
}

impl EnvItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentTargetRunnerConfig {
    pub resources: Option<Resources>,
    pub hpa_conf: Option<HpaConf>,
    pub envs: Option<Vec<EnvItem>>,
}

/// Target configuration as exchanged with the backend, both directions.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentTargetConfig {
    pub hpa_conf: Option<HpaConf>,
    pub resources: Option<Resources>,
    pub envs: Option<Vec<EnvItem>>,
    pub runners: Option<BTreeMap<String, DeploymentTargetRunnerConfig>>,
    pub enable_ingress: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeploymentTargetSchema {
    #[serde(rename = "type")]
    pub target_type: DeploymentTargetType,
    pub bento_repository: String,
    pub bento: String,
    pub canary_rules: Option<Vec<CanaryRule>>,
    pub config: Option<DeploymentTargetConfig>,
}

/// Request body of `POST .../deployments`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeploymentSchema {
    pub cluster_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub kube_namespace: Option<String>,
    pub targets: Vec<CreateDeploymentTargetSchema>,
}

/// Request body of `PATCH .../deployments/{name}`. Name, cluster and
/// namespace are fixed once a deployment exists.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDeploymentSchema {
    pub description: Option<String>,
    pub targets: Vec<CreateDeploymentTargetSchema>,
}

impl From<CreateDeploymentSchema> for UpdateDeploymentSchema {
    fn from(value: CreateDeploymentSchema) -> Self {
        Self {
            description: value.description,
            targets: value.targets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTargetSchema {
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub target_type: DeploymentTargetType,
    pub bento: BentoWithRepositorySchema,
    pub canary_rules: Option<Vec<CanaryRule>>,
    pub config: Option<DeploymentTargetConfig>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRevisionSchema {
    pub uid: String,
    pub status: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub targets: Vec<DeploymentTargetSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSchema {
    pub uid: String,
    pub name: String,
    pub description: Option<String>,
    pub kube_namespace: Option<String>,
    pub status: Option<String>,
    pub cluster: Option<ClusterSchema>,
    pub latest_revision: Option<DeploymentRevisionSchema>,
}
