use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::deployment::reconcile::draft_reconciler::DraftReconciler;

/// One open deployment form held on the server.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSession {
    pub id: Uuid,
    pub reconciler: DraftReconciler,
    /// Set while a submission for this draft is outstanding.
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl DraftSession {
    pub fn new(reconciler: DraftReconciler) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reconciler,
            submitting: false,
            created_at: now,
            touched_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    /// Idle past `ttl` and not in the middle of a submission.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.submitting && now - self.touched_at > ttl
    }
}
