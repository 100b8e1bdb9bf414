use libsql::Row;
use serde::{Deserialize, Serialize};

/// A stored short link. Serializes as `{slug, target}`; the owner stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub slug: String,
    pub target: String,
    #[serde(skip)]
    pub created_by: String,
}

impl Link {
    pub fn new(slug: impl Into<String>, target: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            target: target.into(),
            created_by: created_by.into(),
        }
    }

    /// Maps a `slug, target, created_by` row.
    pub(crate) fn from_row(row: &Row) -> Result<Self, libsql::Error> {
        Ok(Self {
            slug: row.get(0)?,
            target: row.get(1)?,
            created_by: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self, libsql::Error> {
        Ok(Self { name: row.get(0)? })
    }
}
