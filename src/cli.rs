//! Command-line entry points: the HTTP server plus the administrative commands.
//!
//! Every command opens its own replica and closes it before returning, whatever the
//! outcome.

use std::net::TcpListener;
use std::path::PathBuf;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::db::{schema, Storage, UserRepository};
use crate::{configure_routes, AppState, Settings, TokenService};

#[derive(Parser, Debug)]
#[command(name = "shortit", author, version, about = "URL shortener with token-protected links")]
pub struct Cli {
    /// Extra configuration file, layered over config/default and under the environment
    #[arg(long, short = 'c', global = true, env = "SHORTIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create a token for a user, registering the user if needed
    IssueToken {
        user: String,

        /// Expire the token after this many hours (overrides token_ttl_hours)
        #[arg(long)]
        ttl_hours: Option<i64>,
    },

    /// Delete a user and the links they created
    DeleteUser { user: String },

    /// Drop and recreate all tables
    ResetDatabase,
}

pub async fn run(command: Command, settings: Settings) -> Result<()> {
    match command {
        Command::Serve => serve(settings).await,
        Command::IssueToken { user, ttl_hours } => {
            let token = issue_token(&settings, &user, ttl_hours).await?;
            println!("Token: {}", token);
            Ok(())
        }
        Command::DeleteUser { user } => {
            delete_user(&settings, &user).await?;
            println!("Successfully deleted user and its data: {}", user);
            Ok(())
        }
        Command::ResetDatabase => {
            reset_database(&settings).await?;
            println!("Database reset");
            Ok(())
        }
    }
}

async fn open_storage(settings: &Settings) -> Result<Storage> {
    if settings.turso_database_url.is_empty() {
        bail!("turso_database_url is not configured");
    }

    let storage = Storage::open(
        &settings.turso_database_url,
        &settings.turso_auth_token,
        settings.sync_interval(),
    )
    .await
    .context("Failed to open database")?;

    Ok(storage)
}

pub async fn serve(settings: Settings) -> Result<()> {
    let mut storage = open_storage(&settings).await?;
    schema::prepare(&storage.connection()?).await;

    let state = web::Data::new(AppState::new(settings.clone(), &storage)?);

    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .with_context(|| format!("Failed to bind {}:{}", settings.host, settings.port))?;
    info!("Listening on http://{}:{}", settings.host, settings.port);

    let server_state = state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(server_state.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(settings.workers.max(1) as usize)
    .run()
    .await;

    // In-flight requests have drained; release the repositories before the replica.
    drop(state);
    storage.close();

    result.context("HTTP server failed")
}

/// Registers `user` if needed and returns a fresh token for it.
pub async fn issue_token(settings: &Settings, user: &str, ttl_hours: Option<i64>) -> Result<String> {
    let mut tokens = TokenService::from_settings(settings)?;
    if let Some(hours) = ttl_hours {
        tokens = tokens.with_ttl((hours > 0).then(|| chrono::Duration::hours(hours)));
    }

    let mut storage = open_storage(settings).await?;
    let result = register_and_issue(&storage, &tokens, user).await;
    storage.close();
    result
}

async fn register_and_issue(storage: &Storage, tokens: &TokenService, user: &str) -> Result<String> {
    let conn = storage.connection()?;
    schema::prepare(&conn).await;

    let token = tokens.issue(user)?;
    UserRepository::new(conn)
        .create(user)
        .await
        .with_context(|| format!("Failed to register user {}", user))?;

    info!("Issued token for {}", user);
    Ok(token)
}

pub async fn delete_user(settings: &Settings, user: &str) -> Result<u64> {
    let mut storage = open_storage(settings).await?;
    let result = remove_user(&storage, user).await;
    storage.close();
    result
}

async fn remove_user(storage: &Storage, user: &str) -> Result<u64> {
    let conn = storage.connection()?;
    schema::prepare(&conn).await;

    UserRepository::new(conn)
        .delete(user)
        .await
        .with_context(|| format!("Failed to delete user {}", user))
}

pub async fn reset_database(settings: &Settings) -> Result<()> {
    let mut storage = open_storage(settings).await?;
    let conn = storage.connection()?;

    schema::drop_tables(&conn).await;
    schema::prepare(&conn).await;
    info!("Schema recreated");

    drop(conn);
    storage.close();
    Ok(())
}
