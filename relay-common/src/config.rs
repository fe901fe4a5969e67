//! Configuration management for the chat relay.
//!
//! The relay reads an optional configuration file at `~/.innovate-relay/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! ## Server
//! - `PORT` → server.port
//! - `RELAY_BIND_ADDRESS` → server.host
//!
//! ## Provider
//! - `RELAY_PROVIDER` → provider.kind (`gemini` or `deepseek`)
//! - `USE_DEEPSEEK` → provider.kind = deepseek when `true`/`1`
//! - `RELAY_PROVIDER_TIMEOUT_SECS` → provider.timeout_secs
//! - `GEMINI_API_KEY` (fallback `GOOGLE_API_KEY`) → provider.gemini.api_key
//! - `DEEPSEEK_API_KEY` → provider.deepseek.api_key
//!
//! ## Observability
//! - `RELAY_LOG_LEVEL` → observability.log_level
//! - `RELAY_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".innovate-relay"),
        |dirs| dirs.home_dir().join(".innovate-relay"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load a `.env` file from the working directory into the process environment.
///
/// Returns the path that was loaded, if any. A missing file is not an error.
/// Runs before logging is set up, so the caller reports the outcome.
pub fn load_dotenv() -> std::result::Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// No file present; built-in defaults
    Defaults,
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider selection and per-provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chat behavior
    #[serde(default)]
    pub chat: ChatConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_or_default(&config_path())
    }

    /// Load configuration from `path`, falling back to defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }

        let config = Self::load_from(path)?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::load()?;
        config.apply_env_overrides()?;
        Ok((config, source))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored; an unknown provider kind is an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            if let Ok(p) = port.trim().parse() {
                self.server.port = p;
            }
        }
        if let Some(bind) = lookup("RELAY_BIND_ADDRESS") {
            self.server.host = bind;
        }

        if let Some(flag) = lookup("USE_DEEPSEEK") {
            if is_truthy(&flag) {
                self.provider.kind = ProviderKind::DeepSeek;
            }
        }
        // The explicit selector wins over the legacy switch.
        if let Some(kind) = lookup("RELAY_PROVIDER") {
            self.provider.kind = kind
                .parse()
                .with_context(|| "Invalid RELAY_PROVIDER value".to_string())?;
        }
        if let Some(secs) = lookup("RELAY_PROVIDER_TIMEOUT_SECS") {
            if let Ok(s) = secs.trim().parse() {
                self.provider.timeout_secs = s;
            }
        }

        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.provider.gemini.api_key = Some(key);
        }
        if let Some(key) = lookup("DEEPSEEK_API_KEY") {
            self.provider.deepseek.api_key = Some(key);
        }

        if let Some(level) = lookup("RELAY_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("RELAY_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        Ok(())
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port. Default: 5000
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Which LLM provider answers chat turns. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Gemini-style generation endpoint (flattened prompt, formatted reply)
    #[default]
    Gemini,
    /// DeepSeek-style chat-completion endpoint (role-tagged messages)
    #[serde(rename = "deepseek")]
    DeepSeek,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "primary" => Ok(Self::Gemini),
            "deepseek" | "secondary" => Ok(Self::DeepSeek),
            other => Err(crate::Error::Config(format!("unknown provider '{other}'"))),
        }
    }
}

/// Provider selection plus the settings of each variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Active provider variant
    #[serde(default)]
    pub kind: ProviderKind,

    /// Upper bound for one upstream round trip, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub deepseek: DeepSeekConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            timeout_secs: default_timeout(),
            gemini: GeminiConfig::default(),
            deepseek: DeepSeekConfig::default(),
        }
    }
}

/// Gemini generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter. Never logged.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Full `generateContent` URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_gemini_max_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_gemini_endpoint(),
            temperature: default_temperature(),
            max_output_tokens: default_gemini_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
        }
    }
}

/// DeepSeek chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSeekConfig {
    /// API key, sent as a bearer token. Never logged.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Full chat-completions URL
    #[serde(default = "default_deepseek_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_deepseek_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_deepseek_max_tokens")]
    pub max_tokens: u32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_deepseek_endpoint(),
            model: default_deepseek_model(),
            temperature: default_temperature(),
            max_tokens: default_deepseek_max_tokens(),
        }
    }
}

// ============================================================================
// Chat & Observability Configuration
// ============================================================================

/// Chat behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// User id assumed when a chat request carries none
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_timeout() -> u64 {
    60
}
fn default_temperature() -> f64 {
    0.7
}
fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        .into()
}
fn default_gemini_max_tokens() -> u32 {
    1024
}
fn default_top_p() -> f64 {
    0.95
}
fn default_top_k() -> u32 {
    40
}
fn default_deepseek_endpoint() -> String {
    "https://api.deepseek.com/v1/chat/completions".into()
}
fn default_deepseek_model() -> String {
    "deepseek-r1-chat".into()
}
fn default_deepseek_max_tokens() -> u32 {
    800
}
fn default_user_id() -> String {
    "default_user".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
