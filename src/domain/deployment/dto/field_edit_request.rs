use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::deployment::reconcile::field_path::FieldPath;

/// Generic edit of one draft field. The path is checked when it is parsed
/// and again against the draft when applied.
///
/// ```json
/// { "path": "targets.0.config.hpa_conf.max_replicas", "value": 4 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEditRequest {
    pub path: FieldPath,
    #[serde(default)]
    pub value: Value,
}
