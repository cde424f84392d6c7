use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::error::RetryConfig;
use crate::models::CreatorProfile;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudioConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub linkedin: LinkedInConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub sponsorship: SponsorshipConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

/// Deadline and retry policy applied by the gateway to every delegated call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_initial_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_ideation_temperature")]
    pub ideation_temperature: f32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    #[serde(default = "default_linkedin_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub access_token: Option<String>,

    /// `urn:li:person:...` or `urn:li:organization:...` the posts are authored by.
    #[serde(default)]
    pub author_urn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default = "default_youtube_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_comments")]
    pub max_comments: usize,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorshipConfig {
    #[serde(default = "default_assets_path")]
    pub assets_path: PathBuf,

    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub creator: CreatorProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Sender address; falls back to `username`.
    #[serde(default)]
    pub from: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_llm_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_ideation_temperature() -> f32 {
    0.5
}

fn default_temperature() -> f32 {
    0.7
}

fn default_linkedin_api_base() -> String {
    "https://api.linkedin.com".to_string()
}

fn default_youtube_api_base() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_max_comments() -> usize {
    25
}

fn default_page_size() -> u32 {
    100
}

fn default_assets_path() -> PathBuf {
    PathBuf::from("config").join("sponsors.json")
}

fn default_subject() -> String {
    "Sponsorship Inquiry".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_llm_api_base(),
            api_key: None,
            model: default_llm_model(),
            ideation_temperature: default_ideation_temperature(),
            temperature: default_temperature(),
        }
    }
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            api_base: default_linkedin_api_base(),
            access_token: None,
            author_urn: None,
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: default_youtube_api_base(),
            api_key: None,
            max_comments: default_max_comments(),
            page_size: default_page_size(),
        }
    }
}

impl Default for SponsorshipConfig {
    fn default() -> Self {
        Self {
            assets_path: default_assets_path(),
            subject: default_subject(),
            smtp: SmtpConfig::default(),
            creator: CreatorProfile::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
        }
    }
}

impl StudioConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    /// Layer the given files (missing ones are skipped), then `STUDIO_*`
    /// variables, then the well-known credential variables.
    ///
    /// Nested keys use a double underscore: `STUDIO_UPSTREAM__TIMEOUT_SECS`.
    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("STUDIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut studio_config: StudioConfig = config.try_deserialize()?;
        studio_config.apply_well_known_env();
        studio_config.validate()?;

        Ok(studio_config)
    }

    fn apply_well_known_env(&mut self) {
        if let Ok(level) = std::env::var("STUDIO_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        if let Some(key) = non_empty_env("GROQ_API_KEY") {
            self.llm.api_key = Some(key);
        }

        if let Some(key) = non_empty_env("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }

        if let Some(token) = non_empty_env("LINKEDIN_ACCESS_TOKEN") {
            self.linkedin.access_token = Some(token);
        }

        if let Some(urn) = non_empty_env("LINKEDIN_AUTHOR_URN") {
            self.linkedin.author_urn = Some(urn);
        }

        if let Some(address) = non_empty_env("EMAIL_ADDRESS") {
            self.sponsorship.smtp.username = Some(address);
        }

        if let Some(password) = non_empty_env("EMAIL_PASSWORD") {
            self.sponsorship.smtp.password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.server.port == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "server.port".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(ConfigLoadError::MissingRequired("server.host".to_string()));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "upstream.timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        for (key, url) in [
            ("llm.api_base", &self.llm.api_base),
            ("linkedin.api_base", &self.linkedin.api_base),
            ("youtube.api_base", &self.youtube.api_base),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigLoadError::InvalidValue {
                    key: key.to_string(),
                    message: "Must be a URL starting with http:// or https://".to_string(),
                });
            }
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigLoadError::MissingRequired("llm.model".to_string()));
        }

        if self.youtube.max_comments == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "youtube.max_comments".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.youtube.page_size == 0 || self.youtube.page_size > 100 {
            return Err(ConfigLoadError::InvalidValue {
                key: "youtube.page_size".to_string(),
                message: "Must be between 1 and 100".to_string(),
            });
        }

        if self.sponsorship.smtp.port == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "sponsorship.smtp.port".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        // any RUST_LOG-style filter is accepted, not only a bare level
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!("Invalid log filter '{}': {}", self.logging.level, e),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigLoadError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigLoadError::InvalidValue {
                key: "server.host".to_string(),
                message: format!("{}", e),
            })
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for idempotent delegated calls.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::for_upstream(
            self.max_retries,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }
}

impl SmtpConfig {
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("studio.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("creator-studio"))
}
