use anyhow::{Context, Result};

/// Worker configuration loaded from environment variables.
/// Fails at startup if required variables are missing; the search and
/// generation provider keys are optional — absence puts the corresponding
/// stage into fallback mode instead of aborting.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub brave_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            brave_api_key: optional_env("BRAVE_API_KEY"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats unset and empty values the same — an empty key is as useless as a
/// missing one for the external providers.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
