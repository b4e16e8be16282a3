use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use super::draft_session::DraftSession;

#[async_trait]
pub trait DraftSessionRepositoryTrait: Send + Sync {
    /// Current snapshot of a session.
    async fn get(&self, id: Uuid) -> Option<Arc<DraftSession>>;

    async fn insert(&self, session: DraftSession) -> Arc<DraftSession>;

    /// Mutate a session through a closure.
    ///
    /// The closure works on a copy; the copy replaces the stored snapshot
    /// only when the closure returns `Ok`.
    async fn update<F, T>(&self, id: Uuid, f: F) -> anyhow::Result<(Arc<DraftSession>, T)>
    where
        F: FnOnce(&mut DraftSession) -> anyhow::Result<T> + Send,
        T: Send;

    async fn remove(&self, id: Uuid) -> Option<Arc<DraftSession>>;

    /// Drop sessions idle for longer than `ttl`. Returns how many went.
    async fn prune_idle(&self, ttl: Duration) -> usize;
}
