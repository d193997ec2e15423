//! LinguaNotes Common Library
//!
//! Shared code for the LinguaNotes service including:
//! - Database models and repository pattern
//! - Error types and handling
//! - Configuration management
//! - Identity resolution (JWT / JWKS)
//! - Lifecycle event sink
//! - Translation provider abstraction

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod translation;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use events::{AuditAction, EventSink, NoteEvent};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
