#![allow(dead_code)]

use shortit::db::schema;
use shortit::{AppState, Settings, Storage, TokenService};

pub const SECRET: &str = "integration_secret";

pub fn settings() -> Settings {
    Settings {
        environment: "test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        workers: 1,
        turso_database_url: String::new(),
        turso_auth_token: String::new(),
        app_secret: SECRET.into(),
        sync_interval_secs: 60,
        token_ttl_hours: 0,
    }
}

/// A prepared local database with an application state on top of it.
pub struct TestContext {
    pub storage: Storage,
    pub state: AppState,
    pub tokens: TokenService,
}

impl TestContext {
    pub async fn new() -> Self {
        let storage = Storage::open_local().await.expect("Failed to open local storage");
        schema::prepare(&storage.connection().unwrap()).await;

        let state = AppState::new(settings(), &storage).expect("Failed to build app state");
        let tokens = TokenService::new(SECRET, None).unwrap();

        Self { storage, state, tokens }
    }

    /// Registers `user` and returns an `Authorization` header value for it.
    pub async fn bearer_for(&self, user: &str) -> String {
        self.state.users.create(user).await.unwrap();
        format!("Bearer {}", self.tokens.issue(user).unwrap())
    }
}
