//! Client-side reconciliation of a deployment draft.

pub mod config_blob;
pub mod draft_reconciler;
pub mod field_path;
