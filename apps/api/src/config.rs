use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Loaded once in `main` and handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Missing key is not fatal at startup: every model call fails with a
    /// configuration error instead.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Without a database URL the service keeps saved recipes in memory.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub variation_pause_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_url: optional_env("DATABASE_URL"),
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            variation_pause_ms: optional_env("VARIATION_PAUSE_MS")
                .unwrap_or_else(|| "1000".to_string())
                .parse::<u64>()
                .context("VARIATION_PAUSE_MS must be a whole number of milliseconds")?,
        })
    }
}

/// Blank values are treated the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
