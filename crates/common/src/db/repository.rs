//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling. Every note query that takes an owner id
//! filters on it, so callers cannot observe notes they do not own.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Statement,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of an owner's notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePage {
    pub data: Vec<Note>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Find user by identity-provider subject
    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Fetch a user, provisioning the row on first sight.
    ///
    /// Insert-or-reuse, not upsert-on-every-request: the insert is a no-op
    /// when the row already exists, including when a concurrent request
    /// provisioned it first.
    pub async fn get_or_create_user(&self, id: &str, email: &str) -> Result<User> {
        if let Some(user) = self.find_user_by_id(id).await? {
            return Ok(user);
        }

        tracing::info!(email = %email, "Provisioning new user");

        let now = chrono::Utc::now();
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO users (id, email, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
            vec![id.into(), email.into(), now.into()],
        );

        use sea_orm::ConnectionTrait;
        self.write_conn().execute(stmt).await?;

        self.find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("User {} missing after provisioning", id),
            })
    }

    // ========================================================================
    // Note Operations
    // ========================================================================

    /// Create a new note bound to its owner
    pub async fn create_note(
        &self,
        user_id: &str,
        title: String,
        content: String,
        language_code: LanguageCode,
    ) -> Result<Note> {
        let now = chrono::Utc::now();

        let note = NoteActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            title: Set(title),
            content: Set(content),
            language_code: Set(language_code.as_str().to_string()),
            created_at: Set(now.into()),
        };

        note.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find a note by id, scoped to its owner.
    ///
    /// Returns None both when the note does not exist and when it belongs
    /// to another user.
    pub async fn find_note_for_owner(&self, note_id: Uuid, user_id: &str) -> Result<Option<Note>> {
        NoteEntity::find_by_id(note_id)
            .filter(NoteColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find an owned note together with its derived artifacts
    pub async fn find_note_with_artifacts(
        &self,
        note_id: Uuid,
        user_id: &str,
    ) -> Result<Option<(Note, Option<NoteSummary>, Vec<NoteTranslation>)>> {
        let Some(note) = self.find_note_for_owner(note_id, user_id).await? else {
            return Ok(None);
        };

        let summary = self.find_summary_by_note(note_id).await?;
        let translations = NoteTranslationEntity::find()
            .filter(NoteTranslationColumn::NoteId.eq(note_id))
            .order_by_asc(NoteTranslationColumn::TargetLanguageCode)
            .all(self.read_conn())
            .await?;

        Ok(Some((note, summary, translations)))
    }

    /// List an owner's notes with optional filters and offset pagination
    pub async fn list_notes(
        &self,
        user_id: &str,
        search: Option<&str>,
        language: Option<LanguageCode>,
        page: u64,
        limit: u64,
    ) -> Result<NotePage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut query = NoteEntity::find()
            .filter(NoteColumn::UserId.eq(user_id))
            .order_by_desc(NoteColumn::CreatedAt);

        if let Some(search) = search {
            // Case-insensitive substring match on title
            let pattern = format!("%{}%", escape_like(search));
            query = query.filter(Expr::col((NoteEntity, NoteColumn::Title)).ilike(pattern));
        }

        if let Some(language) = language {
            query = query.filter(NoteColumn::LanguageCode.eq(language.as_str()));
        }

        let paginator = query.paginate(self.read_conn(), limit);
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page - 1).await?;

        Ok(NotePage {
            data,
            total,
            page,
            limit,
        })
    }

    /// Apply the supplied fields to an already-fetched note
    pub async fn update_note(
        &self,
        note: Note,
        title: Option<String>,
        content: Option<String>,
        language_code: Option<LanguageCode>,
    ) -> Result<Note> {
        let mut active: NoteActiveModel = note.into();

        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(content) = content {
            active.content = Set(content);
        }
        if let Some(language_code) = language_code {
            active.language_code = Set(language_code.as_str().to_string());
        }

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a note and its derived artifacts.
    ///
    /// The summary and translations are removed explicitly so the cascade
    /// does not depend on foreign-key DDL this crate does not own.
    pub async fn delete_note_cascade(&self, note_id: Uuid) -> Result<bool> {
        NoteTranslationEntity::delete_many()
            .filter(NoteTranslationColumn::NoteId.eq(note_id))
            .exec(self.write_conn())
            .await?;

        NoteSummaryEntity::delete_many()
            .filter(NoteSummaryColumn::NoteId.eq(note_id))
            .exec(self.write_conn())
            .await?;

        let result = NoteEntity::delete_by_id(note_id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Summary Operations
    // ========================================================================

    /// Find the summary attached to a note
    pub async fn find_summary_by_note(&self, note_id: Uuid) -> Result<Option<NoteSummary>> {
        NoteSummaryEntity::find()
            .filter(NoteSummaryColumn::NoteId.eq(note_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create the note's summary, or overwrite it in place when one exists.
    ///
    /// Expressed as a single conflict-handled upsert so two concurrent
    /// summarise calls converge on one row instead of racing a
    /// find-then-insert sequence.
    pub async fn upsert_summary(&self, note_id: Uuid, summary: String) -> Result<NoteSummary> {
        let now = chrono::Utc::now();
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO note_summaries (id, note_id, summary, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (note_id) DO UPDATE SET
                summary = EXCLUDED.summary,
                created_at = EXCLUDED.created_at
            RETURNING id, note_id, summary, created_at
            "#,
            vec![
                Uuid::new_v4().into(),
                note_id.into(),
                summary.into(),
                now.into(),
            ],
        );

        NoteSummaryEntity::find()
            .from_raw_sql(stmt)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Summary upsert for note {} returned no row", note_id),
            })
    }

    // ========================================================================
    // Translation Operations
    // ========================================================================

    /// Find the cached translation for a (note, target language) pair
    pub async fn find_translation(
        &self,
        note_id: Uuid,
        target_language_code: LanguageCode,
    ) -> Result<Option<NoteTranslation>> {
        NoteTranslationEntity::find()
            .filter(NoteTranslationColumn::NoteId.eq(note_id))
            .filter(NoteTranslationColumn::TargetLanguageCode.eq(target_language_code.as_str()))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a translation for a (note, target language) pair.
    ///
    /// A translation is immutable once created: when a concurrent request
    /// wins the insert, the stored row is returned unchanged.
    pub async fn create_translation(
        &self,
        note_id: Uuid,
        target_language_code: LanguageCode,
        text: String,
    ) -> Result<NoteTranslation> {
        let now = chrono::Utc::now();
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO note_translations (id, note_id, target_language_code, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (note_id, target_language_code) DO NOTHING
            RETURNING id, note_id, target_language_code, text, created_at
            "#,
            vec![
                Uuid::new_v4().into(),
                note_id.into(),
                target_language_code.as_str().into(),
                text.into(),
                now.into(),
            ],
        );

        if let Some(inserted) = NoteTranslationEntity::find()
            .from_raw_sql(stmt)
            .one(self.write_conn())
            .await?
        {
            return Ok(inserted);
        }

        // Lost the race; the existing row is the translation.
        self.find_translation(note_id, target_language_code)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Translation insert for note {} returned no row", note_id),
            })
    }

    // ========================================================================
    // Audit Operations
    // ========================================================================

    /// Append one audit log row
    pub async fn insert_audit_log(
        &self,
        action: &str,
        note_id: Option<Uuid>,
        meta: Option<serde_json::Value>,
        user_id: Option<String>,
    ) -> Result<AuditLog> {
        let now = chrono::Utc::now();

        let entry = AuditLogActiveModel {
            id: Set(Uuid::new_v4()),
            action: Set(action.to_string()),
            note_id: Set(note_id),
            meta: Set(meta),
            user_id: Set(user_id),
            created_at: Set(now.into()),
        };

        entry.insert(self.write_conn()).await.map_err(Into::into)
    }
}

/// Escape LIKE wildcards in user-supplied search input
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("meet"), "meet");
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
