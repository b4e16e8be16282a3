use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::deployment::error::DraftError;

use super::draft_session::DraftSession;
use super::draft_session_repository_trait::DraftSessionRepositoryTrait;

pub struct DraftSessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<DraftSession>>>>,
}

impl DraftSessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for DraftSessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DraftSessionRepositoryTrait for DraftSessionRepository {
    async fn get(&self, id: Uuid) -> Option<Arc<DraftSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    async fn insert(&self, session: DraftSession) -> Arc<DraftSession> {
        let session = Arc::new(session);
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    async fn update<F, T>(&self, id: Uuid, f: F) -> anyhow::Result<(Arc<DraftSession>, T)>
    where
        F: FnOnce(&mut DraftSession) -> anyhow::Result<T> + Send,
        T: Send,
    {
        let mut guard = self.sessions.write().await;
        let current = guard.get(&id).ok_or(DraftError::SessionNotFound(id))?;

        // Work on a copy so a failed closure publishes nothing
        let mut next = (**current).clone();
        let out = f(&mut next)?;
        next.touch();

        let next = Arc::new(next);
        guard.insert(id, next.clone());
        Ok((next, out))
    }

    async fn remove(&self, id: Uuid) -> Option<Arc<DraftSession>> {
        self.sessions.write().await.remove(&id)
    }

    async fn prune_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut guard = self.sessions.write().await;
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired(now, ttl));
        before - guard.len()
    }
}
