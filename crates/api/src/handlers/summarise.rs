//! Summarisation handler

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::notes::SummaryResponse;
use crate::AppState;
use linguanotes_common::{auth::AuthUser, errors::Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummariseRequest {
    pub note_id: Uuid,
}

/// Create or refresh the summary of one of the caller's notes
pub async fn summarise(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SummariseRequest>,
) -> Result<Json<SummaryResponse>> {
    let summary = state
        .summarise
        .summarise(request.note_id, &auth.user_id)
        .await?;

    Ok(Json(summary.into()))
}
