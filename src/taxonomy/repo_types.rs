use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// The two classification lists a tool is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Category,
    Ecosystem,
}

impl TaxonomyKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Ecosystem => "ecosystems",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Ecosystem => "ecosystem",
        }
    }
}

/// A category or ecosystem row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Term {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
