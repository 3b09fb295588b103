// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Test size used when a composition request does not name one.
pub const DEFAULT_QUESTIONS_COUNT: i64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL, or `memory:` for the in-process store.
    pub database_url: String,
    /// Shared secret of the hosted auth provider's HS256 tokens.
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub default_questions_count: i64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let default_questions_count = env::var("DEFAULT_QUESTIONS_COUNT")
            .ok()
            .and_then(|c| c.parse().ok())
            .filter(|c| (1..=100).contains(c))
            .unwrap_or(DEFAULT_QUESTIONS_COUNT);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            default_questions_count,
            cors_origins,
        }
    }

    /// Whether the in-process store was requested instead of Postgres.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory:")
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
