//! Note service
//!
//! CRUD over notes, always scoped to the owning user. `get` is the single
//! ownership gate every note-scoped operation goes through: a note owned by
//! someone else is indistinguishable from a note that does not exist.

use linguanotes_common::db::models::{LanguageCode, Note, NoteSummary, NoteTranslation};
use linguanotes_common::db::NotePage;
use linguanotes_common::errors::{AppError, Result};
use linguanotes_common::events::{AuditAction, EventSink, NoteEvent};
use linguanotes_common::Repository;
use uuid::Uuid;

/// Filters for listing an owner's notes
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub search: Option<String>,
    pub language: Option<LanguageCode>,
    pub page: u64,
    pub limit: u64,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub language_code: Option<LanguageCode>,
}

impl NoteChanges {
    /// Names of the fields this update touches, for the audit trail
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        if self.language_code.is_some() {
            fields.push("languageCode");
        }
        fields
    }
}

#[derive(Clone)]
pub struct NoteService {
    repo: Repository,
    events: EventSink,
}

impl NoteService {
    pub fn new(repo: Repository, events: EventSink) -> Self {
        Self { repo, events }
    }

    /// Create a note bound to its owner
    pub async fn create(
        &self,
        owner_id: &str,
        title: String,
        content: String,
        language: LanguageCode,
    ) -> Result<Note> {
        let note = self
            .repo
            .create_note(owner_id, title, content, language)
            .await?;

        self.events.emit(
            NoteEvent::new(AuditAction::NoteCreated, owner_id, note.id)
                .with_meta(serde_json::json!({ "title": note.title })),
        );

        Ok(note)
    }

    /// List the owner's notes, newest first
    pub async fn list(&self, owner_id: &str, filter: NoteFilter) -> Result<NotePage> {
        self.repo
            .list_notes(
                owner_id,
                filter.search.as_deref(),
                filter.language,
                filter.page,
                filter.limit,
            )
            .await
    }

    /// The ownership gate. Fails with NoteNotFound when no note with this
    /// id is owned by `owner_id`, whatever the underlying reason.
    pub async fn get(&self, note_id: Uuid, owner_id: &str) -> Result<Note> {
        self.repo
            .find_note_for_owner(note_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NoteNotFound {
                id: note_id.to_string(),
            })
    }

    /// Fetch an owned note with its summary and translations attached
    pub async fn get_with_artifacts(
        &self,
        note_id: Uuid,
        owner_id: &str,
    ) -> Result<(Note, Option<NoteSummary>, Vec<NoteTranslation>)> {
        self.repo
            .find_note_with_artifacts(note_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NoteNotFound {
                id: note_id.to_string(),
            })
    }

    /// Apply a partial update to an owned note
    pub async fn update(
        &self,
        note_id: Uuid,
        owner_id: &str,
        changes: NoteChanges,
    ) -> Result<Note> {
        let note = self.get(note_id, owner_id).await?;
        let changed = changes.changed_fields();

        let updated = self
            .repo
            .update_note(note, changes.title, changes.content, changes.language_code)
            .await?;

        self.events.emit(
            NoteEvent::new(AuditAction::NoteUpdated, owner_id, updated.id)
                .with_meta(serde_json::json!({ "changes": changed })),
        );

        Ok(updated)
    }

    /// Delete an owned note and everything derived from it.
    ///
    /// The title goes into the event before the row disappears.
    pub async fn delete(&self, note_id: Uuid, owner_id: &str) -> Result<()> {
        let note = self.get(note_id, owner_id).await?;
        let title = note.title;

        self.repo.delete_note_cascade(note_id).await?;

        self.events.emit(
            NoteEvent::new(AuditAction::NoteDeleted, owner_id, note_id)
                .with_meta(serde_json::json!({ "title": title })),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguanotes_common::db::DbPool;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn note_fixture(owner: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            title: "Meeting notes".to_string(),
            content: "Agenda for Monday. Bring coffee.".to_string(),
            language_code: "en".to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> (NoteService, tokio::sync::mpsc::UnboundedReceiver<NoteEvent>) {
        let repo = Repository::new(DbPool::from_connection(db));
        let (events, rx) = EventSink::channel();
        (NoteService::new(repo, events), rx)
    }

    #[tokio::test]
    async fn test_get_hides_missing_and_foreign_notes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Note>::new()])
            .into_connection();
        let (service, _rx) = service_with(db);

        let err = service.get(Uuid::new_v4(), "someone-else").await.unwrap_err();
        assert!(matches!(err, AppError::NoteNotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_returns_owned_note() {
        let note = note_fixture("user-1");
        let note_id = note.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![note.clone()]])
            .into_connection();
        let (service, _rx) = service_with(db);

        let found = service.get(note_id, "user-1").await.unwrap();
        assert_eq!(found.id, note_id);
        assert_eq!(found.title, "Meeting notes");
    }

    #[tokio::test]
    async fn test_delete_cascades_and_captures_title() {
        let note = note_fixture("user-1");
        let note_id = note.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![note]])
            .append_exec_results([
                // translations, summary, note
                MockExecResult { last_insert_id: 0, rows_affected: 2 },
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
            ])
            .into_connection();
        let (service, mut rx) = service_with(db);

        service.delete(note_id, "user-1").await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, AuditAction::NoteDeleted);
        assert_eq!(event.note_id, Some(note_id));
        assert_eq!(event.meta.unwrap()["title"], "Meeting notes");
    }

    #[tokio::test]
    async fn test_update_reports_changed_fields() {
        let note = note_fixture("user-1");
        let note_id = note.id;
        let mut updated = note.clone();
        updated.title = "Renamed".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![note], vec![updated]])
            .into_connection();
        let (service, mut rx) = service_with(db);

        let changes = NoteChanges {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = service.update(note_id, "user-1", changes).await.unwrap();
        assert_eq!(result.title, "Renamed");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, AuditAction::NoteUpdated);
        assert_eq!(event.meta.unwrap()["changes"], serde_json::json!(["title"]));
    }

    #[tokio::test]
    async fn test_list_clamps_bounds_and_preserves_order() {
        let newer = note_fixture("user-1");
        let mut older = note_fixture("user-1");
        older.title = "Next meeting".to_string();

        let count_row = std::collections::BTreeMap::from([(
            "num_items",
            sea_orm::Value::BigInt(Some(2)),
        )]);

        // Count query first, then the page fetch, newest first
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row]])
            .append_query_results([vec![newer.clone(), older.clone()]])
            .into_connection();
        let (service, _rx) = service_with(db);

        let filter = NoteFilter {
            search: Some("meet".to_string()),
            language: None,
            page: 0,
            limit: 500,
        };
        let page = service.list("user-1", filter).await.unwrap();

        assert_eq!(page.total, 2);
        // Out-of-range bounds are clamped, not rejected
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);

        let titles: Vec<_> = page.data.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["Meeting notes", "Next meeting"]);
    }

    #[tokio::test]
    async fn test_list_echoes_requested_bounds() {
        let count_row = std::collections::BTreeMap::from([(
            "num_items",
            sea_orm::Value::BigInt(Some(0)),
        )]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row]])
            .append_query_results([Vec::<Note>::new()])
            .into_connection();
        let (service, _rx) = service_with(db);

        let filter = NoteFilter {
            search: None,
            language: Some(LanguageCode::Fr),
            page: 1,
            limit: 10,
        };
        let page = service.list("user-1", filter).await.unwrap();

        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_changed_fields_names() {
        let changes = NoteChanges {
            title: Some("t".into()),
            content: None,
            language_code: Some(LanguageCode::Fr),
        };
        assert_eq!(changes.changed_fields(), vec!["title", "languageCode"]);
        assert!(NoteChanges::default().changed_fields().is_empty());
    }
}
