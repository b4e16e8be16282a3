use anyhow::Result;
use axum::Json;
use http::StatusCode;
use validator::ValidationErrors;

use crate::api::dto::ApiResponse;
use crate::core::client::yatai_client::UpstreamError;
use crate::domain::deployment::error::DraftError;
use crate::errors::{internal_error, AppError};

pub fn to_json<T: serde::Serialize>(
    result: Result<T>
) -> Result<Json<ApiResponse<T>>, AppError> {
    match result {
        Ok(value) => Ok(Json(ApiResponse::ok(value))),
        Err(err) => Err(app_error(err)),
    }
}

/// Pick the response status from the error's concrete type.
pub fn app_error(err: anyhow::Error) -> AppError {
    if let Some(e) = err.downcast_ref::<DraftError>() {
        return match e {
            DraftError::SessionNotFound(_) => AppError::NotFound(e.to_string()),
            DraftError::SubmissionInFlight => AppError::Conflict(e.to_string()),
            _ => AppError::BodyParsingError(e.to_string()),
        };
    }
    if let Some(e) = err.downcast_ref::<ValidationErrors>() {
        return AppError::BodyParsingError(e.to_string());
    }
    if let Some(e) = err.downcast_ref::<UpstreamError>() {
        if e.status == StatusCode::NOT_FOUND {
            return AppError::NotFound(e.message.clone());
        }
        return AppError::UpstreamError(e.to_string());
    }
    internal_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn maps_known_errors_to_variants() {
        let id = Uuid::new_v4();
        assert!(matches!(
            app_error(DraftError::SessionNotFound(id).into()),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            app_error(DraftError::SubmissionInFlight.into()),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            app_error(DraftError::EmptyTargets.into()),
            AppError::BodyParsingError(_)
        ));
        assert!(matches!(
            app_error(
                UpstreamError {
                    status: StatusCode::NOT_FOUND,
                    message: "deployment not found".into(),
                }
                .into()
            ),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            app_error(
                UpstreamError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: "bad".into(),
                }
                .into()
            ),
            AppError::UpstreamError(_)
        ));
        assert!(matches!(
            app_error(anyhow::anyhow!("boom")),
            AppError::InternalServerError(_)
        ));
    }
}
