//! Core services
//!
//! The note service owns the ownership gate; the summarise and translate
//! services derive artifacts from notes through it. All of them emit
//! lifecycle events through the shared sink after successful writes.

pub mod notes;
pub mod summarise;
pub mod translate;

pub use notes::{NoteChanges, NoteService};
pub use summarise::SummariseService;
pub use translate::TranslateService;
