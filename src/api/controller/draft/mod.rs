use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::deployment::dto::draft_request::{
    ActiveRunnerRequest, ConfigBlobRequest, CreateDraftRequest, OpenDeploymentDraftRequest,
    SelectBentoRequest, SelectClusterRequest,
};
use crate::domain::deployment::dto::draft_view::DraftView;
use crate::domain::deployment::dto::field_edit_request::FieldEditRequest;
use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentSchema, DeploymentSchema,
};
use crate::errors::AppError;

pub struct DeploymentDraftController;

impl DeploymentDraftController {
    pub async fn create_draft(
        State(state): State<AppState>,
        Json(payload): Json<CreateDraftRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.create_draft(payload).await)
    }

    pub async fn open_deployment_draft(
        State(state): State<AppState>,
        Json(payload): Json<OpenDeploymentDraftRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.open_deployment_draft(payload).await)
    }

    pub async fn get_draft(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.get_draft(id).await)
    }

    pub async fn discard(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(state.draft_service.discard(id).await)
    }

    pub async fn reload_revision(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.reload_revision(id).await)
    }

    pub async fn select_cluster(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
        Json(payload): Json<SelectClusterRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.select_cluster(id, payload).await)
    }

    pub async fn select_bento(
        State(state): State<AppState>,
        Path((id, index)): Path<(Uuid, usize)>,
        Json(payload): Json<SelectBentoRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.select_bento(id, index, payload).await)
    }

    pub async fn set_active_runner(
        State(state): State<AppState>,
        Path((id, index)): Path<(Uuid, usize)>,
        Json(payload): Json<ActiveRunnerRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.set_active_runner(id, index, payload).await)
    }

    pub async fn set_config_blob(
        State(state): State<AppState>,
        Path((id, index)): Path<(Uuid, usize)>,
        Json(payload): Json<ConfigBlobRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.set_config_blob(id, index, payload).await)
    }

    pub async fn edit_field(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
        Json(payload): Json<FieldEditRequest>,
    ) -> Result<Json<ApiResponse<DraftView>>, AppError> {
        to_json(state.draft_service.edit_field(id, payload).await)
    }

    /// Body that `submit` would send, without sending it
    pub async fn preview_payload(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<ApiResponse<CreateDeploymentSchema>>, AppError> {
        to_json(state.draft_service.preview_payload(id).await)
    }

    pub async fn submit(
        State(state): State<AppState>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<ApiResponse<DeploymentSchema>>, AppError> {
        to_json(state.draft_service.submit(id).await)
    }
}
