use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl: chrono::Duration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "relief".to_string()),
            jwt_ttl: parse_jwt_ttl(
                &env::var("JWT_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
            )?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            db_acquire_timeout: Duration::from_secs(
                env::var("DB_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("DB_ACQUIRE_TIMEOUT_SECS must be a valid number")?,
            ),
        })
    }
}

/// Token lifetime in whole hours; must be positive and representable.
fn parse_jwt_ttl(hours: &str) -> Result<chrono::Duration> {
    let hours: i64 = hours
        .trim()
        .parse()
        .context("JWT_TTL_HOURS must be a whole number of hours")?;
    if hours <= 0 {
        anyhow::bail!("JWT_TTL_HOURS must be positive, got {}", hours);
    }
    chrono::Duration::try_hours(hours).context("JWT_TTL_HOURS is out of range")
}
