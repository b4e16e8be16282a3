use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::deployment_schema::{
    CanaryRule, DeploymentTargetType, EnvItem, HpaConf, ResourceItem, Resources,
};

/// Per-runner configuration inside a draft target.
///
/// `bentoml_config` of `None` means the runner shares its target's blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfigDraft {
    pub hpa_conf: Option<HpaConf>,
    pub resources: Option<Resources>,
    pub envs: Vec<EnvItem>,
    pub bentoml_config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfigDraft {
    pub hpa_conf: Option<HpaConf>,
    pub resources: Option<Resources>,
    pub envs: Vec<EnvItem>,
    pub runners: BTreeMap<String, RunnerConfigDraft>,
    pub enable_ingress: Option<bool>,
    pub bentoml_config: String,
}

impl TargetConfigDraft {
    /// Defaults a new target starts from.
    pub fn baseline() -> Self {
        Self {
            hpa_conf: Some(baseline_hpa_conf()),
            resources: Some(baseline_resources()),
            envs: Vec::new(),
            runners: BTreeMap::new(),
            enable_ingress: Some(true),
            bentoml_config: String::new(),
        }
    }
}

pub fn baseline_hpa_conf() -> HpaConf {
    HpaConf {
        min_replicas: Some(2),
        max_replicas: Some(10),
    }
}

pub fn baseline_resources() -> Resources {
    Resources {
        requests: Some(ResourceItem {
            cpu: "500m".into(),
            memory: "500Mi".into(),
            ..ResourceItem::default()
        }),
        limits: Some(ResourceItem {
            cpu: "1000m".into(),
            memory: "1024Mi".into(),
            ..ResourceItem::default()
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDraft {
    #[serde(rename = "type")]
    pub target_type: DeploymentTargetType,
    pub bento_repository: String,
    pub bento: String,
    pub canary_rules: Option<Vec<CanaryRule>>,
    pub config: TargetConfigDraft,
}

impl TargetDraft {
    pub fn baseline() -> Self {
        Self {
            config: TargetConfigDraft::baseline(),
            ..Self::default()
        }
    }

    /// Every env list owned by this target, runners included.
    pub fn env_lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<EnvItem>> + '_ {
        std::iter::once(&mut self.config.envs)
            .chain(self.config.runners.values_mut().map(|r| &mut r.envs))
    }
}

/// The deployment request being edited.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentDraft {
    pub cluster_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub kube_namespace: Option<String>,
    pub targets: Vec<TargetDraft>,
}
