use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BentoRepositorySchema {
    pub uid: Option<String>,
    pub name: String,
}

/// A resource amount as written in a manifest: a bare number (`2`, `0.5`)
/// or a quantity string (`"500m"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceHint {
    Number(f64),
    Text(String),
}

impl ResourceHint {
    /// Quantity string, or `None` for zero and blank values.
    pub fn as_quantity(&self) -> Option<String> {
        match self {
            ResourceHint::Number(n) => Some(*n)
                .filter(|n| n.is_finite() && *n != 0.0)
                .map(|n| n.to_string()),
            ResourceHint::Text(s) => {
                let s = s.trim();
                let zero = s.parse::<f64>().is_ok_and(|n| n == 0.0);
                (!s.is_empty() && !zero).then(|| s.to_string())
            }
        }
    }
}

/// Resource hint declared by a runner in the bento manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BentoRunnerResourceConfig {
    #[serde(default)]
    pub cpu: Option<ResourceHint>,
    #[serde(default)]
    pub nvidia_gpu: Option<ResourceHint>,
}

impl BentoRunnerResourceConfig {
    pub fn cpu_quantity(&self) -> Option<String> {
        self.cpu.as_ref().and_then(ResourceHint::as_quantity)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BentoRunnerSchema {
    pub name: String,
    pub runnable_type: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub models: Vec<String>,
    pub resource_config: Option<BentoRunnerResourceConfig>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BentoManifestSchema {
    pub service: Option<String>,
    pub bentoml_version: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub runners: Vec<BentoRunnerSchema>,
}

impl BentoManifestSchema {
    /// Runner names in declaration order.
    pub fn runner_names(&self) -> Vec<String> {
        self.runners.iter().map(|r| r.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BentoWithRepositorySchema {
    pub uid: Option<String>,
    pub version: String,
    pub repository: BentoRepositorySchema,
    pub manifest: Option<BentoManifestSchema>,
}
