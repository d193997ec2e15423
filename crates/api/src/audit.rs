//! Audit trail recorder
//!
//! Drains note lifecycle events from the in-process channel into the
//! audit_logs table. Runs as a background task; a failed insert is logged
//! and dropped so the request path never waits on, or fails because of,
//! the audit trail.

use linguanotes_common::events::NoteEvent;
use linguanotes_common::Repository;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

pub struct AuditRecorder {
    repo: Repository,
    rx: UnboundedReceiver<NoteEvent>,
}

impl AuditRecorder {
    pub fn new(repo: Repository, rx: UnboundedReceiver<NoteEvent>) -> Self {
        Self { repo, rx }
    }

    /// Consume events until every sender is dropped
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.record(event).await;
        }
        debug!("Audit recorder stopped: event channel closed");
    }

    async fn record(&self, event: NoteEvent) {
        let action = event.action;
        match self
            .repo
            .insert_audit_log(
                action.as_str(),
                event.note_id,
                event.meta,
                Some(event.user_id),
            )
            .await
        {
            Ok(entry) => {
                debug!(action = %action, audit_id = %entry.id, "Audit entry recorded");
            }
            Err(e) => {
                error!(action = %action, error = %e, "Failed to record audit entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguanotes_common::db::models::AuditLog;
    use linguanotes_common::db::DbPool;
    use linguanotes_common::events::{AuditAction, EventSink};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_events_are_persisted() {
        let note_id = Uuid::new_v4();
        let row = AuditLog {
            id: Uuid::new_v4(),
            action: "note.created".to_string(),
            note_id: Some(note_id),
            meta: Some(serde_json::json!({ "title": "Meeting notes" })),
            user_id: Some("user-1".to_string()),
            created_at: chrono::Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();
        let repo = Repository::new(DbPool::from_connection(db));

        let (events, rx) = EventSink::channel();
        let recorder = AuditRecorder::new(repo, rx);

        events.emit(
            NoteEvent::new(AuditAction::NoteCreated, "user-1", note_id)
                .with_meta(serde_json::json!({ "title": "Meeting notes" })),
        );
        drop(events);

        // Runs to completion once the sink is gone
        recorder.run().await;
    }

    #[tokio::test]
    async fn test_insert_failure_is_swallowed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = Repository::new(DbPool::from_connection(db));

        let (events, rx) = EventSink::channel();
        let recorder = AuditRecorder::new(repo, rx);

        events.emit(NoteEvent::new(
            AuditAction::NoteDeleted,
            "user-1",
            Uuid::new_v4(),
        ));
        drop(events);

        // The loop survives the failed insert and exits normally
        recorder.run().await;
    }
}
