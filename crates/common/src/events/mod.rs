//! Note lifecycle events
//!
//! A typed event sink decouples the note, summarise, and translate services
//! from audit persistence. Emission is fire-and-forget: it never fails,
//! delays, or rolls back the operation that produced the event.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Lifecycle actions recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    NoteCreated,
    NoteUpdated,
    NoteDeleted,
    NoteSummarised,
    NoteTranslated,
}

impl AuditAction {
    /// The action tag persisted in audit log rows
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::NoteCreated => "note.created",
            AuditAction::NoteUpdated => "note.updated",
            AuditAction::NoteDeleted => "note.deleted",
            AuditAction::NoteSummarised => "note.summarised",
            AuditAction::NoteTranslated => "note.translated",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutating lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteEvent {
    pub action: AuditAction,
    pub user_id: String,
    pub note_id: Option<Uuid>,
    pub meta: Option<serde_json::Value>,
}

impl NoteEvent {
    pub fn new(action: AuditAction, user_id: impl Into<String>, note_id: Uuid) -> Self {
        Self {
            action,
            user_id: user_id.into(),
            note_id: Some(note_id),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Sending half of the event channel, cloned into every service
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<NoteEvent>,
}

impl EventSink {
    /// Create the sink and the receiving half the audit recorder drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NoteEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. A closed channel is logged and absorbed; the caller
    /// never observes a failure.
    pub fn emit(&self, event: NoteEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(
                action = %e.0.action,
                "Event dropped: audit channel closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags() {
        assert_eq!(AuditAction::NoteCreated.as_str(), "note.created");
        assert_eq!(AuditAction::NoteUpdated.as_str(), "note.updated");
        assert_eq!(AuditAction::NoteDeleted.as_str(), "note.deleted");
        assert_eq!(AuditAction::NoteSummarised.as_str(), "note.summarised");
        assert_eq!(AuditAction::NoteTranslated.as_str(), "note.translated");
    }

    #[tokio::test]
    async fn test_emit_delivers_event() {
        let (sink, mut rx) = EventSink::channel();
        let note_id = Uuid::new_v4();

        sink.emit(
            NoteEvent::new(AuditAction::NoteCreated, "user-1", note_id)
                .with_meta(serde_json::json!({"title": "Meeting notes"})),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, AuditAction::NoteCreated);
        assert_eq!(event.user_id, "user-1");
        assert_eq!(event.note_id, Some(note_id));
        assert_eq!(event.meta.unwrap()["title"], "Meeting notes");
    }

    #[tokio::test]
    async fn test_emit_survives_closed_channel() {
        let (sink, rx) = EventSink::channel();
        drop(rx);

        // Must not panic or error
        sink.emit(NoteEvent::new(
            AuditAction::NoteDeleted,
            "user-1",
            Uuid::new_v4(),
        ));
    }
}
