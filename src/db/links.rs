use libsql::{params, Connection};
use tracing::debug;

use crate::db::models::Link;
use crate::error::DatabaseError;
use crate::Result;

/// Access to the `links` table. Every call is a round trip; nothing is cached.
#[derive(Clone)]
pub struct LinkRepository {
    conn: Connection,
}

impl LinkRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts the link, or replaces the target of an existing slug. The original
    /// `created_by` is kept on overwrite and is not checked against the caller.
    pub async fn upsert(&self, slug: &str, target: &str, created_by: &str) -> Result<Link> {
        self.conn
            .execute(
                "INSERT INTO links (slug, target, created_by) VALUES (?1, ?2, ?3)
                 ON CONFLICT(slug) DO UPDATE SET target = excluded.target",
                params![slug, target, created_by],
            )
            .await?;

        self.get_by_slug(slug).await
    }

    /// All links in storage order, which is unspecified.
    pub async fn list(&self) -> Result<Vec<Link>> {
        let mut rows = self
            .conn
            .query("SELECT slug, target, created_by FROM links", ())
            .await?;

        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(Link::from_row(&row)?);
        }
        Ok(links)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Link> {
        let mut rows = self
            .conn
            .query(
                "SELECT slug, target, created_by FROM links WHERE slug = ?1",
                params![slug],
            )
            .await?;

        let row = rows.next().await?.ok_or(DatabaseError::NotFound)?;
        Ok(Link::from_row(&row)?)
    }

    /// Returns the number of rows removed; deleting a missing slug is not an error.
    pub async fn delete_by_slug(&self, slug: &str) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM links WHERE slug = ?1", params![slug])
            .await?;
        debug!("Deleted {} link(s) for slug {}", removed, slug);
        Ok(removed)
    }

    pub async fn delete_by_owner(&self, owner: &str) -> Result<u64> {
        delete_owned_by(&self.conn, owner).await
    }
}

/// Shared with the user cascade so it can run inside that caller's transaction.
pub(crate) async fn delete_owned_by(conn: &Connection, owner: &str) -> Result<u64> {
    let removed = conn
        .execute("DELETE FROM links WHERE created_by = ?1", params![owner])
        .await?;
    debug!("Deleted {} link(s) owned by {}", removed, owner);
    Ok(removed)
}
