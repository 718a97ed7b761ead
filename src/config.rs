use std::env;

/// Longest session lifetime accepted from the environment (one year)
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    /// Argon2 time cost used when hashing new passwords
    pub password_hash_iterations: u32,
    pub openlibrary_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => "development-session-secret".to_string(),
            _ => return Err("SESSION_SECRET environment variable must be set".to_string()),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://virtual_bookshelf.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            session_secret,
            session_ttl_hours: session_ttl_hours(env::var("SESSION_TTL_HOURS").ok()),
            password_hash_iterations: env::var("PASSWORD_HASH_ITERATIONS")
                .ok()
                .and_then(|i| i.parse().ok())
                .filter(|&i| i > 0)
                .unwrap_or(2),
            openlibrary_url: env::var("OPENLIBRARY_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://openlibrary.org".to_string()),
        })
    }
}

fn session_ttl_hours(raw: Option<String>) -> i64 {
    raw.and_then(|h| h.trim().parse().ok())
        .filter(|&h| h > 0 && h <= MAX_SESSION_TTL_HOURS)
        .unwrap_or(24)
}
