use std::env;

use anyhow::{anyhow, Context};

pub const IN_MEMORY_DATABASE: &str = ":memory:";
const DEFAULT_DATABASE_URL: &str = IN_MEMORY_DATABASE;
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 600_000;
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 31;
const MAX_SESSION_LIFETIME_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub secret_key: String,
    /// SQLite file path, or `:memory:`
    pub database_path: String,
    pub bind_address: String,
    pub password_hash_iterations: u32,
    pub session_lifetime_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, anyhow::Error> {
        let secret_key = lookup("SECRET_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(anyhow!("please set SECRET_KEY"))?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let password_hash_iterations = match lookup("PASSWORD_HASH_ITERATIONS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|iterations| *iterations > 0)
                .with_context(|| format!("invalid PASSWORD_HASH_ITERATIONS {:?}", value))?,
            None => DEFAULT_PASSWORD_HASH_ITERATIONS,
        };

        let session_lifetime_days = match lookup("SESSION_LIFETIME_DAYS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_SESSION_LIFETIME_DAYS).contains(days))
                .with_context(|| format!("invalid SESSION_LIFETIME_DAYS {:?}", value))?,
            None => DEFAULT_SESSION_LIFETIME_DAYS,
        };

        Ok(Self {
            secret_key,
            database_path: database_path_from_url(&database_url),
            bind_address: lookup("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            password_hash_iterations,
            session_lifetime_days,
        })
    }
}

// sqlite:///relative.db, sqlite:////absolute.db, sqlite:// is in-memory
fn database_path_from_url(url: &str) -> String {
    let path = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        IN_MEMORY_DATABASE.to_string()
    } else {
        path.to_string()
    }
}
