//! Configuration management for the relay server.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file by the binary). The Gemini API key is mandatory: without it
//! [`AppConfig::from_env`] fails and the server never binds a port.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Public Gemini endpoint used when `GEMINI_API_BASE` is not set.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Persona prompt every new conversation is started with, unless
/// `SYSTEM_PROMPT_FILE` points at a replacement.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are META X AI, a maximally truthful, witty, and helpful AI.
Be direct, sarcastic when appropriate, concise but complete.
Never hallucinate facts. Have personality.
";

/// Main application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Server configuration (host, port)
    pub server: ServerConfig,

    /// Upstream Gemini settings
    pub gemini: GeminiConfig,

    /// Whether to verify SSL certificates for upstream requests
    pub verify_ssl: bool,

    /// Request timeout in seconds for the upstream provider
    pub request_timeout_secs: u64,

    /// Directory holding the landing page and other static assets
    pub static_dir: PathBuf,

    /// System instruction handed to every new conversation
    pub system_prompt: String,
}

/// Server-specific configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
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

/// Gemini provider configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: String,

    /// Base URL of the Generative Language API
    pub api_base: String,

    /// Model name, e.g. `gemini-1.5-flash`
    pub model: String,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("gemini", &self.gemini)
            .field("verify_ssl", &self.verify_ssl)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("static_dir", &self.static_dir)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    300
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `GEMINI_API_KEY` is missing or blank, when a numeric
    /// variable cannot be parsed, or when `SYSTEM_PROMPT_FILE` cannot be read.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` is this function over `std::env::var`; tests pass a closure
    /// over a fixed map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup("GEMINI_API_KEY") {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("GEMINI_API_KEY environment variable is required"),
        };

        let mut server = ServerConfig::default();
        if let Some(host) = lookup("HOST") {
            server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            server.port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS value: {}", raw))?,
            None => default_request_timeout(),
        };

        let verify_ssl = lookup("VERIFY_SSL")
            .map(|v| str_to_bool(&v))
            .unwrap_or(true);

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_static_dir);

        let system_prompt = match lookup("SYSTEM_PROMPT_FILE") {
            Some(path) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read system prompt file: {}", path))?,
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        let gemini = GeminiConfig {
            api_key,
            api_base: lookup("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        Ok(Self {
            server,
            gemini,
            verify_ssl,
            request_timeout_secs,
            static_dir,
            system_prompt,
        })
    }
}

/// Convert string to boolean.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive)
fn str_to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
