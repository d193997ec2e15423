//! Summarise service
//!
//! Computes the single summary attached to a note. A note has at most one
//! summary ever: repeat requests overwrite the existing row in place.

use linguanotes_common::db::models::NoteSummary;
use linguanotes_common::errors::Result;
use linguanotes_common::events::{AuditAction, EventSink, NoteEvent};
use linguanotes_common::Repository;
use uuid::Uuid;

use crate::services::NoteService;

/// Local summariser: takes the first sentence.
///
/// Splits on `.`, `!`, `?` and returns the first non-empty trimmed segment
/// with a trailing period. When the first segment is empty, falls back to
/// the first 100 characters, appending `...` only if content is longer.
pub fn first_sentence_summary(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let first = content
        .split(['.', '!', '?'])
        .next()
        .unwrap_or("")
        .trim();
    if !first.is_empty() {
        return format!("{}.", first);
    }

    let truncated: String = content.chars().take(100).collect();
    if content.chars().count() > 100 {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[derive(Clone)]
pub struct SummariseService {
    notes: NoteService,
    repo: Repository,
    events: EventSink,
}

impl SummariseService {
    pub fn new(notes: NoteService, repo: Repository, events: EventSink) -> Self {
        Self { notes, repo, events }
    }

    /// Summarise an owned note, creating or refreshing its summary row
    pub async fn summarise(&self, note_id: Uuid, owner_id: &str) -> Result<NoteSummary> {
        let note = self.notes.get(note_id, owner_id).await?;

        let summary_text = first_sentence_summary(&note.content);
        let summary = self.repo.upsert_summary(note_id, summary_text).await?;

        self.events
            .emit(NoteEvent::new(AuditAction::NoteSummarised, owner_id, note_id));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguanotes_common::db::models::Note;
    use linguanotes_common::db::DbPool;
    use linguanotes_common::errors::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_first_sentence_extraction() {
        assert_eq!(
            first_sentence_summary("Hello world. Second sentence."),
            "Hello world."
        );
        assert_eq!(first_sentence_summary("Wow! Amazing."), "Wow.");
        assert_eq!(
            first_sentence_summary("Is this it? Yes."),
            "Is this it."
        );
    }

    #[test]
    fn test_no_terminator_gets_trailing_period() {
        assert_eq!(
            first_sentence_summary("no terminator here"),
            "no terminator here."
        );
    }

    #[test]
    fn test_empty_content_yields_empty_summary() {
        assert_eq!(first_sentence_summary(""), "");
    }

    #[test]
    fn test_empty_first_segment_falls_back_to_prefix() {
        // First split segment is empty, content fits in 100 chars
        assert_eq!(first_sentence_summary("?!"), "?!");
        assert_eq!(first_sentence_summary("   "), "   ");
    }

    #[test]
    fn test_long_fallback_is_truncated_with_ellipsis() {
        let content = format!(".{}", "x".repeat(150));
        let summary = first_sentence_summary(&content);
        assert_eq!(summary.chars().count(), 103);
        assert!(summary.starts_with('.'));
        assert!(summary.ends_with("..."));
    }

    fn service_with(
        db: sea_orm::DatabaseConnection,
    ) -> (
        SummariseService,
        tokio::sync::mpsc::UnboundedReceiver<NoteEvent>,
    ) {
        let repo = Repository::new(DbPool::from_connection(db));
        let (events, rx) = EventSink::channel();
        let notes = NoteService::new(repo.clone(), events.clone());
        (SummariseService::new(notes, repo, events), rx)
    }

    #[tokio::test]
    async fn test_summarise_upserts_and_emits() {
        let note = Note {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "Meeting notes".to_string(),
            content: "Agenda for Monday. Bring coffee.".to_string(),
            language_code: "en".to_string(),
            created_at: chrono::Utc::now().into(),
        };
        let note_id = note.id;
        let summary_row = NoteSummary {
            id: Uuid::new_v4(),
            note_id,
            summary: "Agenda for Monday.".to_string(),
            created_at: chrono::Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![note]])
            .append_query_results([vec![summary_row]])
            .into_connection();
        let (service, mut rx) = service_with(db);

        let summary = service.summarise(note_id, "user-1").await.unwrap();
        assert_eq!(summary.summary, "Agenda for Monday.");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, AuditAction::NoteSummarised);
        assert_eq!(event.note_id, Some(note_id));
    }

    #[tokio::test]
    async fn test_summarise_propagates_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Note>::new()])
            .into_connection();
        let (service, mut rx) = service_with(db);

        let err = service.summarise(Uuid::new_v4(), "user-1").await.unwrap_err();
        assert!(matches!(err, AppError::NoteNotFound { .. }));
        assert!(rx.try_recv().is_err());
    }
}
