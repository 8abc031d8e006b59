// src/config.rs

use std::{env, fmt, time::Duration};

use dotenvy::dotenv;
use url::Url;

/// Upper bound on questions in one game, for every mode.
pub const MAX_QUESTIONS_PER_GAME: u32 = 20;

#[derive(Debug)]
pub struct ConfigError(String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    /// Browser origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Question generator endpoint. Without it every game uses the built-in questions.
    pub question_provider_url: Option<Url>,
    pub question_provider_timeout: Duration,
    /// JSON file overriding the built-in plan limits.
    pub plan_limits_path: Option<String>,
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError(format!("{} must be set", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = optional("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let question_provider_url = optional("QUESTION_PROVIDER_URL")
            .map(|v| {
                Url::parse(&v)
                    .map_err(|e| ConfigError(format!("QUESTION_PROVIDER_URL is invalid: {}", e)))
            })
            .transpose()?;

        let timeout_secs: u64 = match optional("QUESTION_PROVIDER_TIMEOUT_SECS") {
            Some(v) => v.parse().map_err(|_| {
                ConfigError(format!(
                    "QUESTION_PROVIDER_TIMEOUT_SECS must be seconds, got '{}'",
                    v
                ))
            })?,
            None => 30,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            cors_origins,
            question_provider_url,
            question_provider_timeout: Duration::from_secs(timeout_secs),
            plan_limits_path: optional("PLAN_LIMITS_PATH"),
        })
    }
}
