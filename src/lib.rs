pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;

use actix_web::web;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthenticatedUser, Authenticator, TokenService};
pub use db::{Link, LinkRepository, Storage, User, UserRepository};

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: std::sync::Arc<Settings>,
    pub links: LinkRepository,
    pub users: UserRepository,
    pub authenticator: Authenticator,
}

impl AppState {
    /// Builds repositories on top of an open storage handle. The handle itself stays with
    /// the caller, which closes it after the server has drained.
    pub fn new(config: Settings, storage: &Storage) -> Result<Self> {
        let conn = storage.connection()?;
        let tokens = TokenService::from_settings(&config)?;

        let links = LinkRepository::new(conn.clone());
        let users = UserRepository::new(conn);
        let authenticator = Authenticator::new(tokens, users.clone());

        Ok(Self {
            config: std::sync::Arc::new(config),
            links,
            users,
            authenticator,
        })
    }
}

/// Registers every route. `/ping` comes before `/{slug}` so it is never treated as a slug.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .route("/ping", web::get().to(handlers::ping))
        .route("/", web::get().to(handlers::list_links))
        .route("/", web::post().to(handlers::upsert_link))
        .route("/{slug}", web::get().to(handlers::redirect))
        .route("/{slug}", web::delete().to(handlers::delete_link));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_settings(secret: &str) -> Settings {
        Settings {
            environment: "test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            workers: 1,
            turso_database_url: String::new(),
            turso_auth_token: String::new(),
            app_secret: secret.into(),
            sync_interval_secs: 60,
            token_ttl_hours: 0,
        }
    }

    #[tokio::test]
    async fn test_app_state_requires_secret() {
        let storage = Storage::open_local().await.unwrap();
        let state = AppState::new(test_settings(""), &storage);

        assert!(matches!(state, Err(AppError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_app_state_requires_open_storage() {
        let mut storage = Storage::open_local().await.unwrap();
        storage.close();

        let state = AppState::new(test_settings("secret"), &storage);
        assert!(matches!(state, Err(AppError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_app_state_clone() {
        let storage = Storage::open_local().await.unwrap();
        let state = AppState::new(test_settings("secret"), &storage).unwrap();

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
    }
}
