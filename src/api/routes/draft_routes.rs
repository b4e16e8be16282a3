use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::api::controller::draft::DeploymentDraftController;
use crate::app_state::AppState;

pub fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(DeploymentDraftController::create_draft))
        .route("/from-deployment", post(DeploymentDraftController::open_deployment_draft))
        .route(
            "/{id}",
            get(DeploymentDraftController::get_draft).delete(DeploymentDraftController::discard),
        )
        .route("/{id}/reload", post(DeploymentDraftController::reload_revision))
        .route("/{id}/cluster", put(DeploymentDraftController::select_cluster))
        .route("/{id}/targets/{index}/bento", put(DeploymentDraftController::select_bento))
        .route(
            "/{id}/targets/{index}/active-runner",
            put(DeploymentDraftController::set_active_runner),
        )
        .route(
            "/{id}/targets/{index}/bentoml-config",
            put(DeploymentDraftController::set_config_blob),
        )
        .route("/{id}/fields", patch(DeploymentDraftController::edit_field))
        .route("/{id}/payload", get(DeploymentDraftController::preview_payload))
        .route("/{id}/submit", post(DeploymentDraftController::submit))
}
