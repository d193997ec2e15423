//! Note CRUD handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::services::NoteChanges;
use crate::AppState;
use linguanotes_common::{
    auth::AuthUser,
    db::models::{LanguageCode, Note, NoteSummary, NoteTranslation},
    errors::{AppError, Result},
};

use crate::services::notes::NoteFilter;

/// Request to create a new note
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,

    #[validate(custom(function = validate_language_code))]
    pub language_code: String,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    #[validate(custom(function = validate_language_code))]
    pub language_code: Option<String>,
}

/// Listing filters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    pub search: Option<String>,
    pub language: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub language_code: String,
    pub created_at: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            language_code: note.language_code,
            created_at: note.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    pub summary: String,
    pub created_at: String,
}

impl From<NoteSummary> for SummaryResponse {
    fn from(summary: NoteSummary) -> Self {
        Self {
            id: summary.id,
            note_id: summary.note_id,
            summary: summary.summary,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    pub target_language_code: String,
    pub text: String,
    pub created_at: String,
}

impl From<NoteTranslation> for TranslationResponse {
    fn from(translation: NoteTranslation) -> Self {
        Self {
            id: translation.id,
            note_id: translation.note_id,
            target_language_code: translation.target_language_code,
            text: translation.text,
            created_at: translation.created_at.to_rfc3339(),
        }
    }
}

/// A note with its derived artifacts attached
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetailResponse {
    #[serde(flatten)]
    pub note: NoteResponse,
    pub summary: Option<SummaryResponse>,
    pub translations: Vec<TranslationResponse>,
}

#[derive(Serialize)]
pub struct NoteListResponse {
    pub data: Vec<NoteResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn validate_language_code(value: &str) -> std::result::Result<(), ValidationError> {
    if LanguageCode::parse(value).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("language_code")
            .with_message("languageCode must be one of: en, fr, de, it, es".into()))
    }
}

fn parse_language(value: &str) -> Result<LanguageCode> {
    LanguageCode::parse(value).ok_or_else(|| AppError::Validation {
        message: format!("Unsupported language code: {}", value),
        field: Some("languageCode".to_string()),
    })
}

/// Create a note owned by the caller
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let language = parse_language(&request.language_code)?;

    let note = state
        .notes
        .create(&auth.user_id, request.title, request.content, language)
        .await?;

    Ok((StatusCode::CREATED, Json(note.into())))
}

/// List the caller's notes, newest first
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotesQuery>,
) -> Result<Json<NoteListResponse>> {
    let language = query.language.as_deref().map(parse_language).transpose()?;

    let filter = NoteFilter {
        search: query.search,
        language,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(10),
    };

    let page = state.notes.list(&auth.user_id, filter).await?;

    Ok(Json(NoteListResponse {
        data: page.data.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// Get one of the caller's notes with its summary and translations
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<NoteDetailResponse>> {
    let (note, summary, translations) = state
        .notes
        .get_with_artifacts(note_id, &auth.user_id)
        .await?;

    Ok(Json(NoteDetailResponse {
        note: note.into(),
        summary: summary.map(Into::into),
        translations: translations.into_iter().map(Into::into).collect(),
    }))
}

/// Apply a partial update to one of the caller's notes
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let language_code = request
        .language_code
        .as_deref()
        .map(parse_language)
        .transpose()?;

    let changes = NoteChanges {
        title: request.title,
        content: request.content,
        language_code,
    };

    let note = state.notes.update(note_id, &auth.user_id, changes).await?;

    Ok(Json(note.into()))
}

/// Delete one of the caller's notes and everything derived from it
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.notes.delete(note_id, &auth.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Note deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code_validation() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("es").is_ok());
        assert!(validate_language_code("jp").is_err());
        assert!(validate_language_code("").is_err());
        // Codes are stored lowercase and matched exactly
        assert!(validate_language_code("EN").is_err());
    }

    #[test]
    fn test_create_request_bounds() {
        let request = CreateNoteRequest {
            title: "".to_string(),
            content: "body".to_string(),
            language_code: "en".to_string(),
        };
        assert!(request.validate().is_err());

        let request = CreateNoteRequest {
            title: "t".repeat(101),
            content: "body".to_string(),
            language_code: "en".to_string(),
        };
        assert!(request.validate().is_err());

        let request = CreateNoteRequest {
            title: "Meeting notes".to_string(),
            content: "Agenda for Monday.".to_string(),
            language_code: "en".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_request_allows_absent_fields() {
        let request = UpdateNoteRequest {
            title: None,
            content: None,
            language_code: None,
        };
        assert!(request.validate().is_ok());

        let request = UpdateNoteRequest {
            title: Some("".to_string()),
            content: None,
            language_code: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_note_response_shape() {
        let note = Note {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "Meeting notes".to_string(),
            content: "Agenda for Monday.".to_string(),
            language_code: "en".to_string(),
            created_at: chrono::Utc::now().into(),
        };
        let response = NoteResponse::from(note);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["title"], "Meeting notes");
        assert_eq!(json["languageCode"], "en");
        assert!(json["createdAt"].is_string());
        assert!(json.get("user_id").is_none());
    }
}
