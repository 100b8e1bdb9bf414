use std::path::Path;
use std::time::Duration;

use libsql::{Builder, Connection, Database};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StorageError;

const REPLICA_DIR_PREFIX: &str = "libsql-";
const REPLICA_FILE: &str = "local.db";

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Owns a process-unique replica directory, the replicating database and its connection.
///
/// Reads are served from the local replica and may lag the remote by up to one sync
/// interval. Writes are forwarded to the remote primary. Call [`Storage::close`] once the
/// server has stopped serving requests; dropping the handle closes it as well.
pub struct Storage {
    dir: Option<TempDir>,
    database: Option<Database>,
    conn: Option<Connection>,
}

impl Storage {
    /// Opens an embedded replica of `remote_url` that re-syncs every `sync_interval`.
    pub async fn open(
        remote_url: &str,
        auth_token: &str,
        sync_interval: Duration,
    ) -> Result<Self, StorageError> {
        let dir = replica_dir()?;

        Url::parse(remote_url)
            .map_err(|e| StorageError::Connector(format!("invalid database url {:?}: {}", remote_url, e)))?;

        let path = dir.path().join(REPLICA_FILE);
        let database = Builder::new_remote_replica(&path, remote_url.to_string(), auth_token.to_string())
            .sync_interval(sync_interval)
            .build()
            .await
            .map_err(|e| StorageError::Connector(e.to_string()))?;

        // Populate the replica before the first request is served.
        database
            .sync()
            .await
            .map_err(|e| StorageError::Connector(e.to_string()))?;

        info!(
            "Opened replica of {} at {} (sync every {:?})",
            remote_url,
            path.display(),
            sync_interval
        );
        Self::assemble(dir, database)
    }

    /// Opens a standalone database file in a fresh temporary directory, without a remote.
    pub async fn open_local() -> Result<Self, StorageError> {
        let dir = replica_dir()?;
        let path = dir.path().join(REPLICA_FILE);

        let database = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| StorageError::Connector(e.to_string()))?;

        debug!("Opened local database at {}", path.display());
        Self::assemble(dir, database)
    }

    fn assemble(dir: TempDir, database: Database) -> Result<Self, StorageError> {
        let conn = database
            .connect()
            .map_err(|e| StorageError::Connector(e.to_string()))?;

        Ok(Self {
            dir: Some(dir),
            database: Some(database),
            conn: Some(conn),
        })
    }

    /// A handle onto the shared connection. Clones are cheap and safe to use concurrently.
    pub fn connection(&self) -> Result<Connection, StorageError> {
        self.conn.clone().ok_or(StorageError::Closed)
    }

    /// Directory holding the replica file, while open.
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Removes the replica directory, then releases the replicating database, then the
    /// connection. Never fails and is safe to call more than once.
    ///
    /// Only this handle's own database and connection are released here. Repositories hold
    /// clones of the connection, so drop them before calling `close`.
    pub fn close(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed replica directory {}", path.display()),
                Err(e) => warn!("Failed to remove replica directory {}: {}", path.display(), e),
            }
        }

        if let Some(database) = self.database.take() {
            drop(database);
            debug!("Replica connector closed");
        }

        if let Some(conn) = self.conn.take() {
            drop(conn);
            info!("Storage closed");
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.close();
    }
}

fn replica_dir() -> Result<TempDir, StorageError> {
    tempfile::Builder::new()
        .prefix(REPLICA_DIR_PREFIX)
        .tempdir()
        .map_err(StorageError::TempDir)
}
