//! Application configuration management.
//!
//! Configuration is loaded from environment variables through the `envy`
//! crate, which deserializes them into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `TOKEN_SECRET` (required): HMAC key for short-lived API tokens
/// - `TOKEN_TTL_SECS` (optional): token lifetime, defaults to 900 (15 min)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub token_secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_token_ttl() -> i64 {
    900
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Attempts to load a `.env` file first (ignored if absent), then
    /// deserializes the environment into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or cannot be
    /// parsed into the expected types.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
