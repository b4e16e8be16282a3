use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterConfigSchema {
    pub default_deployment_kube_namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSchema {
    pub uid: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub config: Option<ClusterConfigSchema>,
}

impl ClusterSchema {
    /// Configured default namespace for deployments, ignoring blank values.
    pub fn default_deployment_kube_namespace(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.default_deployment_kube_namespace.as_deref())
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
    }
}
