use libsql::{params, Connection};
use tracing::info;

use crate::db::links::delete_owned_by;
use crate::db::models::User;
use crate::error::DatabaseError;
use crate::Result;

#[derive(Clone)]
pub struct UserRepository {
    conn: Connection,
}

impl UserRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts the user; an existing name is left untouched.
    pub async fn create(&self, name: &str) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )
            .await?;
        Ok(User::new(name))
    }

    pub async fn get(&self, name: &str) -> Result<User> {
        let mut rows = self
            .conn
            .query("SELECT name FROM users WHERE name = ?1", params![name])
            .await?;

        let row = rows.next().await?.ok_or(DatabaseError::NotFound)?;
        Ok(User::from_row(&row)?)
    }

    /// Removes the user and every link they created, atomically. Returns the number of
    /// links removed. A missing user is not an error.
    pub async fn delete(&self, name: &str) -> Result<u64> {
        let tx = self.conn.transaction().await?;

        tx.execute("DELETE FROM users WHERE name = ?1", params![name])
            .await?;
        let removed = delete_owned_by(&tx, name).await?;

        tx.commit().await?;
        info!("Deleted user {} and {} link(s)", name, removed);
        Ok(removed)
    }
}
