// src/config.rs
//! Startup configuration: environment variables with optional `config.yaml` overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub completion: CompletionConfig,
    pub database_url: String,
}

#[derive(Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl CompletionConfig {
    /// Key for the completion provider; requests fail before any network call without it.
    pub fn require_api_key(&self) -> Result<&str, ApiError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ApiError::Configuration("GROQ_API_KEY"))
    }
}

/// Per-environment section of `config.yaml`. Every field is optional and only
/// overrides what the environment provides.
#[derive(Debug, Default, Deserialize)]
struct FileSection {
    port: Option<u16>,
    database_url: Option<String>,
    database_path: Option<PathBuf>,
    api_url: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: FileSection,
    #[serde(default)]
    production: FileSection,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let environment = std::env::var("VOKE_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string());
        info!("Loading configuration for environment: {}", environment);

        let section = Self::load_file_section(Path::new("config.yaml"), &environment)?;
        Self::from_sources(environment, section, |key| std::env::var(key).ok())
    }

    fn load_file_section(path: &Path, environment: &str) -> Result<FileSection> {
        if !path.exists() {
            return Ok(FileSection::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_sources<F>(environment: String, section: FileSection, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match env("ROCKET_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?,
            None => section.port.unwrap_or(DEFAULT_PORT),
        };

        let database_url = env("DATABASE_URL")
            .or(section.database_url)
            .or_else(|| {
                env("VOKE_DATABASE_PATH")
                    .map(PathBuf::from)
                    .or(section.database_path)
                    .map(|path| format!("sqlite:{}?mode=rwc", path.display()))
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No database configured. Set DATABASE_URL or VOKE_DATABASE_PATH, or add database_url to config.yaml"
                )
            })?;

        let api_key = env("GROQ_API_KEY").filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("GROQ_API_KEY is not set; completion endpoints will fail until it is configured");
        }

        let timeout_seconds = match env("GROQ_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("GROQ_TIMEOUT_SECS must be a number of seconds")?,
            None => section.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            environment,
            port,
            completion: CompletionConfig {
                api_key,
                api_url: env("GROQ_API_URL")
                    .or(section.api_url)
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                model: env("GROQ_MODEL")
                    .or(section.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout_seconds,
            },
            database_url,
        })
    }
}
