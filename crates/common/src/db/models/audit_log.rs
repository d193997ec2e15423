//! Audit log entity
//!
//! Append-only; never mutated after creation. The user reference is weak:
//! it is nulled, not deleted, if the user record disappears.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Action tag, e.g. "note.created", "note.deleted"
    #[sea_orm(column_type = "Text")]
    pub action: String,

    pub note_id: Option<Uuid>,

    /// Free-form event metadata, e.g. {"title": "Old Title"}
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta: Option<Json>,

    #[sea_orm(column_type = "Text", nullable)]
    pub user_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
