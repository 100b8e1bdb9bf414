use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Process settings. Key names match the variables existing deployments already set
/// (`TURSO_DATABASE_URL`, `TURSO_AUTH_TOKEN`, `APP_SECRET`, `PORT`).
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub workers: u32,
    pub turso_database_url: String,
    pub turso_auth_token: String,
    pub app_secret: String,
    pub sync_interval_secs: u64,
    /// Zero disables expiry on issued tokens.
    pub token_ttl_hours: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Layers defaults, `config/default`, `config/{RUN_MODE}`, an optional explicit file
    /// and finally the process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(config_file, Environment::default().try_parsing(true))
    }

    fn build(config_file: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("workers", num_cpus::get() as i64)?
            .set_default("turso_database_url", "")?
            .set_default("turso_auth_token", "")?
            .set_default("app_secret", "")?
            .set_default("sync_interval_secs", 60)?
            .set_default("token_ttl_hours", 0)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        // No prefix: `PORT=5001` sets `port`, `APP_SECRET=...` sets `app_secret`.
        builder
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        (self.token_ttl_hours > 0).then(|| chrono::Duration::hours(self.token_ttl_hours))
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
