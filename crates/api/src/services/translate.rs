//! Translate service
//!
//! Computes per-target-language translations of a note. Each
//! (note, target language) pair is translated once and cached forever;
//! later requests return the stored row unchanged. Content edits do not
//! invalidate cached translations.

use std::sync::Arc;

use linguanotes_common::db::models::{LanguageCode, NoteTranslation};
use linguanotes_common::errors::{AppError, Result};
use linguanotes_common::events::{AuditAction, EventSink, NoteEvent};
use linguanotes_common::translation::Translator;
use linguanotes_common::Repository;
use uuid::Uuid;

use crate::services::NoteService;

#[derive(Clone)]
pub struct TranslateService {
    notes: NoteService,
    repo: Repository,
    translator: Arc<Translator>,
    events: EventSink,
}

impl TranslateService {
    pub fn new(
        notes: NoteService,
        repo: Repository,
        translator: Arc<Translator>,
        events: EventSink,
    ) -> Self {
        Self {
            notes,
            repo,
            translator,
            events,
        }
    }

    /// Translate an owned note into the target language
    pub async fn translate(
        &self,
        note_id: Uuid,
        target: LanguageCode,
        owner_id: &str,
    ) -> Result<NoteTranslation> {
        let note = self.notes.get(note_id, owner_id).await?;

        if note.language_code == target.as_str() {
            return Err(AppError::Validation {
                message: "Target language cannot be the same as source language".to_string(),
                field: Some("targetLanguageCode".to_string()),
            });
        }

        // Cache hit: return the stored row unchanged, no recomputation
        if let Some(existing) = self.repo.find_translation(note_id, target).await? {
            return Ok(existing);
        }

        let source = note.language().ok_or_else(|| AppError::Internal {
            message: format!(
                "Note {} has unknown language code {}",
                note.id, note.language_code
            ),
        })?;

        let text = self.translator.translate(&note.content, source, target).await;

        let translation = self.repo.create_translation(note_id, target, text).await?;

        self.events.emit(
            NoteEvent::new(AuditAction::NoteTranslated, owner_id, note_id)
                .with_meta(serde_json::json!({ "targetLanguageCode": target.as_str() })),
        );

        Ok(translation)
    }
}
