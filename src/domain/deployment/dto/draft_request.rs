use serde::{Deserialize, Serialize};
use validator::Validate;

/// Open a form for a new deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateDraftRequest {
    #[validate(length(min = 1))]
    pub cluster_name: Option<String>,
}

/// Open a form prefilled from an existing deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenDeploymentDraftRequest {
    #[validate(length(min = 1))]
    pub cluster_name: String,
    #[validate(length(min = 1))]
    pub deployment_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SelectClusterRequest {
    #[validate(length(min = 1))]
    pub cluster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SelectBentoRequest {
    #[validate(length(min = 1))]
    pub repository: String,
    #[validate(length(min = 1))]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActiveRunnerRequest {
    #[validate(length(min = 1))]
    pub runner: String,
}

/// `runner` absent edits the target blob. For a runner, a null `value`
/// makes it share the target blob again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConfigBlobRequest {
    #[validate(length(min = 1))]
    pub runner: Option<String>,
    pub value: Option<String>,
}
