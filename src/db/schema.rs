//! Table bootstrap for the `links` and `users` tables.
//!
//! Statements run one at a time and a failure is logged and skipped, so a half-present
//! schema never stops the remaining statements from running. This is an administrative
//! path; callers that need a guaranteed schema should query for it afterwards.

use libsql::Connection;
use tracing::{debug, warn};

const CREATE_STATEMENTS: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS links (
        slug TEXT PRIMARY KEY,
        target TEXT NOT NULL,
        created_by TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        name TEXT PRIMARY KEY
    )",
];

const DROP_STATEMENTS: [&str; 2] = ["DROP TABLE links", "DROP TABLE users"];

/// Creates any missing tables. Safe to call on every start.
pub async fn prepare(conn: &Connection) -> usize {
    run_best_effort(conn, &CREATE_STATEMENTS).await
}

/// Drops both tables unconditionally.
pub async fn drop_tables(conn: &Connection) -> usize {
    run_best_effort(conn, &DROP_STATEMENTS).await
}

/// Returns how many statements failed.
async fn run_best_effort(conn: &Connection, statements: &[&str]) -> usize {
    let mut failed = 0;
    for statement in statements {
        match conn.execute(statement, ()).await {
            Ok(_) => debug!("Executed: {}", first_line(statement)),
            Err(e) => {
                warn!("Ignoring failed statement `{}`: {}", first_line(statement), e);
                failed += 1;
            }
        }
    }
    failed
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement).trim()
}
