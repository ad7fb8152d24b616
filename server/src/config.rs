// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/sqlite.db";
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

// Only acceptable for local development; a warning is logged when used.
const DEV_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Server settings, read from the environment (and `.env` via `dotenvy`).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    /// Text generation is disabled when this is absent.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid BCRYPT_COST value: {raw}"))?,
            None => DEFAULT_BCRYPT_COST,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET is not set, falling back to the development secret.");
            DEV_JWT_SECRET.to_string()
        });

        Ok(Self {
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            bcrypt_cost,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_api_url, DEFAULT_GEMINI_API_URL);
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
            ("GEMINI_API_KEY", "  "),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bcrypt_cost, 4);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));
    }
}
