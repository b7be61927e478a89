//! Configuration for the Unfair Chess server
//!
//! Every setting has a built-in default that an `UNFAIR_CHESS_*` environment
//! variable overrides. The binary layers its command-line flags on top.
//!
//! Data directory precedence:
//! 1. UNFAIR_CHESS_DATA_DIR environment variable
//! 2. ~/.config/unfair-chess/data (production default)
//! 3. ./data (fallback for development)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = ".config/unfair-chess/data";
const DEV_DATA_DIR: &str = "./data";

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_AI_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_AI_MODELS: &[&str] = &["openai/gpt-4o-mini", "meta-llama/llama-3.1-8b-instruct"];
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_AI_COMMENT_RETRIES: u32 = 2;
pub const DEFAULT_RPS_DEADLINE_SECS: u64 = 60;

/// Get the data directory for persistence.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("UNFAIR_CHESS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

pub fn get_bind_addr() -> String {
    std::env::var("UNFAIR_CHESS_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string())
}

/// Directory for daily-rolling log files. Unset means stdout only.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("UNFAIR_CHESS_LOG_DIR").ok().map(PathBuf::from)
}

pub fn get_rps_deadline() -> Duration {
    Duration::from_secs(env_or(
        "UNFAIR_CHESS_RPS_DEADLINE_SECS",
        DEFAULT_RPS_DEADLINE_SECS,
    ))
}

/// Settings for the chat-completions move provider.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub base_url: String,
    /// Without a key the AI only plays random legal moves.
    pub api_key: Option<String>,
    /// First entry is the primary model, the rest are fallbacks in order.
    pub models: Vec<String>,
    pub timeout: Duration,
    pub comment_retries: u32,
}

impl AiConfig {
    pub fn from_env() -> Self {
        let models = std::env::var("UNFAIR_CHESS_AI_MODELS")
            .ok()
            .map(|raw| parse_models(&raw))
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| DEFAULT_AI_MODELS.iter().map(|m| m.to_string()).collect());

        Self {
            base_url: std::env::var("UNFAIR_CHESS_AI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AI_BASE_URL.to_string()),
            api_key: std::env::var("UNFAIR_CHESS_AI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            models,
            timeout: Duration::from_secs(env_or(
                "UNFAIR_CHESS_AI_TIMEOUT_SECS",
                DEFAULT_AI_TIMEOUT_SECS,
            )),
            comment_retries: env_or("UNFAIR_CHESS_AI_COMMENT_RETRIES", DEFAULT_AI_COMMENT_RETRIES),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            api_key: None,
            models: DEFAULT_AI_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            comment_retries: DEFAULT_AI_COMMENT_RETRIES,
        }
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind: String,
    pub log_dir: Option<PathBuf>,
    pub rps_deadline: Duration,
    pub ai: AiConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: get_data_dir(),
            bind: get_bind_addr(),
            log_dir: get_log_dir(),
            rps_deadline: get_rps_deadline(),
            ai: AiConfig::from_env(),
        }
    }
}

/// Split a comma separated model list, dropping blanks.
pub fn parse_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}
