//! SeaORM entity models
//!
//! Database entities for LinguaNotes

mod audit_log;
mod note;
mod note_summary;
mod note_translation;
mod user;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use note::{
    Entity as NoteEntity,
    Model as Note,
    ActiveModel as NoteActiveModel,
    Column as NoteColumn,
    LanguageCode,
};

pub use note_summary::{
    Entity as NoteSummaryEntity,
    Model as NoteSummary,
    ActiveModel as NoteSummaryActiveModel,
    Column as NoteSummaryColumn,
};

pub use note_translation::{
    Entity as NoteTranslationEntity,
    Model as NoteTranslation,
    ActiveModel as NoteTranslationActiveModel,
    Column as NoteTranslationColumn,
};

pub use audit_log::{
    Entity as AuditLogEntity,
    Model as AuditLog,
    ActiveModel as AuditLogActiveModel,
    Column as AuditLogColumn,
};
