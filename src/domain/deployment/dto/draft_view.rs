use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::state::runtime::draft::draft_session::DraftSession;
use crate::domain::deployment::model::draft::DeploymentDraft;
use crate::domain::deployment::reconcile::draft_reconciler::{
    DraftMode, NamespaceSource, TargetEditorState,
};

/// What the form renders for one session.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    pub mode: DraftMode,
    pub draft: DeploymentDraft,
    pub editors: Vec<TargetEditorState>,
    pub namespace_source: NamespaceSource,
    pub last_revision_uid: Option<String>,
    pub submitting: bool,
    pub touched_at: DateTime<Utc>,
}

impl From<&DraftSession> for DraftView {
    fn from(session: &DraftSession) -> Self {
        let reconciler = &session.reconciler;
        Self {
            id: session.id,
            mode: reconciler.mode(),
            draft: reconciler.draft().clone(),
            editors: reconciler.editors().to_vec(),
            namespace_source: reconciler.namespace_source().clone(),
            last_revision_uid: reconciler.last_revision_uid().map(str::to_string),
            submitting: session.submitting,
            touched_at: session.touched_at,
        }
    }
}
