use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::interview::prompts::DEFAULT_GREETING;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Questions asked before the next interview run closes the interview.
    pub interview_max_turns: u32,
    pub llm_timeout: Duration,
    /// In-process session store when unset.
    pub redis_url: Option<String>,
    pub session_ttl_secs: u64,
    pub interview_greeting: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let interview_max_turns = require_env("INTERVIEW_MAX_TURNS")?
            .parse::<u32>()
            .context("INTERVIEW_MAX_TURNS must be a positive integer")?;
        ensure!(
            interview_max_turns >= 1,
            "INTERVIEW_MAX_TURNS must be at least 1"
        );

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            interview_max_turns,
            llm_timeout: Duration::from_secs(
                parse_env_or("LLM_TIMEOUT_SECS", 60)
                    .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
            ),
            redis_url: std::env::var("REDIS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            session_ttl_secs: parse_env_or("SESSION_TTL_SECS", 86_400)
                .context("SESSION_TTL_SECS must be a number of seconds")?,
            interview_greeting: std::env::var("INTERVIEW_GREETING")
                .ok()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            port: parse_env_or("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
