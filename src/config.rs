use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

/// Runtime settings, layered from defaults, an optional TOML file and the
/// process environment (later layers win).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub listen_addr: String,
    /// Allow any origin; for a frontend served from another host.
    pub cors_allow_any: bool,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub session_cookie_secure: bool,
    /// Key material for signing the session cookie, at least 64 bytes.
    pub session_secret: Option<String>,
}

impl AppConfig {
    /// Load settings using the real process environment.
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        Self::load_with(path, Environment::default().try_parsing(true))
    }

    pub fn load_with(path: &Path, env: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("mongodb_uri", "mongodb://localhost:27017")?
            .set_default("mongodb_database", "kbase")?
            .set_default("listen_addr", "0.0.0.0:3000")?
            .set_default("cors_allow_any", false)?
            .set_default("session_cookie_secure", false)?
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
