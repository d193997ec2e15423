//! Translation handler

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::notes::{validate_language_code, TranslationResponse};
use crate::AppState;
use linguanotes_common::{
    auth::AuthUser,
    db::models::LanguageCode,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub note_id: Uuid,

    #[validate(custom(function = validate_language_code))]
    pub target_language_code: String,
}

/// Translate one of the caller's notes into the target language
pub async fn translate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslationResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let target = LanguageCode::parse(&request.target_language_code).ok_or_else(|| {
        AppError::Validation {
            message: format!(
                "Unsupported language code: {}",
                request.target_language_code
            ),
            field: Some("targetLanguageCode".to_string()),
        }
    })?;

    let translation = state
        .translate
        .translate(request.note_id, target, &auth.user_id)
        .await?;

    Ok(Json(translation.into()))
}
