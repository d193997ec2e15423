//! Note entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The fixed set of languages a note can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Fr,
    De,
    It,
    Es,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 5] = [
        LanguageCode::En,
        LanguageCode::Fr,
        LanguageCode::De,
        LanguageCode::It,
        LanguageCode::Es,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Fr => "fr",
            LanguageCode::De => "de",
            LanguageCode::It => "it",
            LanguageCode::Es => "es",
        }
    }

    /// Parse a code, rejecting anything outside the enumerated set
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(LanguageCode::En),
            "fr" => Some(LanguageCode::Fr),
            "de" => Some(LanguageCode::De),
            "it" => Some(LanguageCode::It),
            "es" => Some(LanguageCode::Es),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::parse(s).ok_or_else(|| format!("unknown language code: {}", s))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user; immutable after creation
    #[sea_orm(column_type = "Text")]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "Text")]
    pub language_code: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The note's language as an enum
    pub fn language(&self) -> Option<LanguageCode> {
        LanguageCode::parse(&self.language_code)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_one = "super::note_summary::Entity")]
    Summary,

    #[sea_orm(has_many = "super::note_translation::Entity")]
    Translations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::note_summary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Summary.def()
    }
}

impl Related<super::note_translation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Translations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code_roundtrip() {
        for code in LanguageCode::ALL {
            assert_eq!(LanguageCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn test_language_code_rejects_unknown() {
        assert_eq!(LanguageCode::parse("jp"), None);
        assert_eq!(LanguageCode::parse("EN"), None);
        assert_eq!(LanguageCode::parse(""), None);
    }
}
