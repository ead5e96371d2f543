use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::auth::password::{MAX_COST, MIN_COST};

/// How `RefreshPassword` authenticates the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordResetMode {
    /// Numeric id plus new password is enough.
    Open,
    /// Caller must also present the account's current session or current password.
    Verified,
}

impl FromStr for PasswordResetMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "verified" => Ok(Self::Verified),
            other => anyhow::bail!("unknown password reset mode: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub session_token_bytes: usize,
    pub bcrypt_cost: u32,
    pub password_reset: PasswordResetMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub run_migrations: bool,
    pub pool: PoolConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let pool = PoolConfig {
            max_connections: env_or("DB_MAX_CONNECTIONS", 25)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", 5)?,
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        };
        let auth = AuthConfig {
            session_token_bytes: env_or("SESSION_TOKEN_BYTES", 32)?,
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            password_reset: env_or("PASSWORD_RESET_MODE", PasswordResetMode::Open)?,
        };
        if !(MIN_COST..=MAX_COST).contains(&auth.bcrypt_cost) {
            anyhow::bail!(
                "invalid BCRYPT_COST={}: must be between {MIN_COST} and {MAX_COST}",
                auth.bcrypt_cost
            );
        }
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080)?,
            run_migrations: env_or("RUN_MIGRATIONS", true)?,
            pool,
            auth,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw}: {e}")),
        _ => Ok(default),
    }
}
