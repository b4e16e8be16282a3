use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::core::client::yatai_client::YataiClient;
use crate::core::state::runtime::draft::draft_session_repository::DraftSessionRepository;
use crate::domain::deployment::service::deployment_draft_service::DeploymentDraftService;

pub type DraftService = DeploymentDraftService<YataiClient, DraftSessionRepository>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub draft_service: Arc<DraftService>,
}

pub fn build_app_state(config: AppConfig) -> Result<AppState> {
    let client = YataiClient::from_config(&config)?;
    Ok(with_client(config, client))
}

pub fn with_client(config: AppConfig, client: YataiClient) -> AppState {
    let service = DeploymentDraftService::new(
        Arc::new(client),
        DraftSessionRepository::new().shared(),
    );
    AppState {
        config: Arc::new(config),
        draft_service: Arc::new(service),
    }
}
