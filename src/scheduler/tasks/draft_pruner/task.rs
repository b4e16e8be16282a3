use std::time::Duration;

use tracing::{debug, info};

use crate::app_state::AppState;

/// Upper bound between two prune passes.
const MAX_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the idle-draft pruner (fire-and-forget).
pub fn spawn_draft_pruner(state: AppState) {
    let ttl = state.config.draft_ttl();
    let period = ttl
        .to_std()
        .map(|ttl| ttl.min(MAX_PRUNE_INTERVAL))
        .unwrap_or(MAX_PRUNE_INTERVAL)
        .max(Duration::from_secs(1));

    tokio::spawn(async move {
        info!(
            "draft pruner: started (ttl={}s, interval={}s)",
            ttl.num_seconds(),
            period.as_secs()
        );

        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            run(&state).await;
        }
    });
}

/// One prune pass. Returns how many drafts were dropped.
pub async fn run(state: &AppState) -> usize {
    let pruned = state
        .draft_service
        .prune_idle(state.config.draft_ttl())
        .await;
    if pruned > 0 {
        info!(pruned, "dropped idle drafts");
    } else {
        debug!("no idle drafts to drop");
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::with_client;
    use crate::config::AppConfig;
    use crate::core::client::yatai_client::YataiClient;
    use crate::domain::deployment::dto::draft_request::CreateDraftRequest;

    #[tokio::test]
    async fn run_keeps_fresh_drafts() {
        let config = AppConfig::default();
        let client = YataiClient::new(
            reqwest::Client::new(),
            &config.yatai_endpoint,
            &config.yatai_organization,
        );
        let state = with_client(config, client);
        let view = state
            .draft_service
            .create_draft(CreateDraftRequest::default())
            .await
            .unwrap();

        assert_eq!(run(&state).await, 0);
        assert!(state.draft_service.get_draft(view.id).await.is_ok());
    }
}
