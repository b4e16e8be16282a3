//! Deployment documents: backend wire schemas and the editable draft.

pub mod bento_schema;
pub mod cluster_schema;
pub mod deployment_schema;
pub mod draft;
